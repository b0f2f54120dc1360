// tests/watch_debounce.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{AccessKind, AccessMode, DataChange, ModifyKind};
use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tokio::time::sleep;

use sitepipe::config::preset_config;
use sitepipe::engine::RuntimeEvent;
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::watch::event_handler::process_file_change;
use sitepipe::watch::{build_profiles_from_config, next_batch, ContentHashes, WatchOptions};

const SETTLE: Duration = Duration::from_millis(100);

fn modify(path: &str) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(PathBuf::from(path))
}

fn open(path: &str) -> Event {
    Event::new(EventKind::Access(AccessKind::Open(AccessMode::Any))).add_path(PathBuf::from(path))
}

#[tokio::test(start_paused = true)]
async fn test_repeated_events_for_one_path_form_one_batch() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(modify("/dev/styles/main.scss")).unwrap();
    tx.send(modify("/dev/styles/main.scss")).unwrap();
    tx.send(modify("/dev/scripts/app.js")).unwrap();

    let batch = next_batch(&mut rx, SETTLE).await.unwrap();
    assert_eq!(
        batch,
        [PathBuf::from("/dev/scripts/app.js"), PathBuf::from("/dev/styles/main.scss")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_events_inside_the_quiet_period_extend_the_batch() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        tx.send(modify("/dev/a.js")).unwrap();
        sleep(Duration::from_millis(60)).await;
        tx.send(modify("/dev/b.js")).unwrap();
        sleep(Duration::from_millis(60)).await;
        tx.send(modify("/dev/c.js")).unwrap();
        sleep(Duration::from_millis(300)).await;
        tx.send(modify("/dev/d.js")).unwrap();
    });

    let first = next_batch(&mut rx, SETTLE).await.unwrap();
    assert_eq!(first, ["/dev/a.js", "/dev/b.js", "/dev/c.js"].map(PathBuf::from));

    let second = next_batch(&mut rx, SETTLE).await.unwrap();
    assert_eq!(second, [PathBuf::from("/dev/d.js")]);

    // Sender dropped after the last event.
    assert_eq!(next_batch(&mut rx, SETTLE).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_access_events_never_open_a_batch() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(open("/dev/styles/main.scss")).unwrap();
    tx.send(modify("/dev/scripts/app.js")).unwrap();
    drop(tx);

    assert_eq!(
        next_batch(&mut rx, SETTLE).await,
        Some(vec![PathBuf::from("/dev/scripts/app.js")])
    );
    assert_eq!(next_batch(&mut rx, SETTLE).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_truncate_then_restore_triggers_nothing_with_hashing() {
    let fs = MockFileSystem::new();
    let path = Path::new("/dev/styles/main.scss");
    fs.add_file(path, "a { color: red; }");

    let profiles = build_profiles_from_config(&preset_config().unwrap()).unwrap();
    let mut hashes = ContentHashes::new();
    hashes.seed(&fs, &[path.to_path_buf()]);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    fs.add_file(path, "");
    event_tx.send(modify("/dev/styles/main.scss")).unwrap();
    fs.add_file(path, "a { color: red; }");
    event_tx.send(modify("/dev/styles/main.scss")).unwrap();

    let (tx, mut rx) = mpsc::channel::<RuntimeEvent>(8);
    let batch = next_batch(&mut event_rx, SETTLE).await.unwrap();
    for changed in &batch {
        process_file_change(&fs, Path::new("/dev"), changed, &profiles, &tx, Some(&mut hashes)).await;
    }
    assert!(rx.try_recv().is_err());

    // A real edit after the settle still gets through.
    fs.add_file(path, "a { color: blue; }");
    event_tx.send(modify("/dev/styles/main.scss")).unwrap();
    let batch = next_batch(&mut event_rx, SETTLE).await.unwrap();
    for changed in &batch {
        process_file_change(&fs, Path::new("/dev"), changed, &profiles, &tx, Some(&mut hashes)).await;
    }
    assert!(matches!(
        rx.try_recv(),
        Ok(RuntimeEvent::TaskTriggered { task, .. }) if task == "styles"
    ));
}

#[test]
fn test_watch_options_follow_the_watch_section() {
    let options = WatchOptions::default();
    assert!(options.use_hash);
    assert_eq!(options.settle, Duration::from_millis(100));
}
