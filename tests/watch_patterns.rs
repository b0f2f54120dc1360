// tests/watch_patterns.rs

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use sitepipe::config::preset_config;
use sitepipe::engine::{RuntimeEvent, TriggerReason};
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::watch::event_handler::{is_relevant, process_file_change};
use sitepipe::watch::path_utils::relative_str;
use sitepipe::watch::{
    build_profiles_from_config, collect_matching_files, compute_file_hash, tasks_for_path,
    watch_roots, ContentHashes, TaskWatchProfile,
};

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn drain(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<String> {
    let mut tasks = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                assert_eq!(reason, TriggerReason::FileWatch);
                tasks.push(task);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    tasks
}

#[test]
fn test_preset_bindings_route_changes_to_tasks() {
    let profiles = build_profiles_from_config(&preset_config().unwrap()).unwrap();

    assert_eq!(tasks_for_path(&profiles, "styles/_vars.scss"), ["styles"]);
    assert_eq!(tasks_for_path(&profiles, "partials/header.html"), ["html", "styles"]);
    assert_eq!(tasks_for_path(&profiles, "scripts/app.js"), ["scripts"]);
    assert_eq!(tasks_for_path(&profiles, "scripts/libs.js"), ["libs"]);
    assert_eq!(tasks_for_path(&profiles, "scripts/vendor/jquery.js"), ["libs"]);
    assert_eq!(tasks_for_path(&profiles, "images/a/b.png"), ["img"]);
    assert!(tasks_for_path(&profiles, "README.md").is_empty());
}

#[test]
fn test_watch_exclude_overrides_watch() {
    let profile = TaskWatchProfile::new(
        "styles",
        &strings(&["styles/**/*"]),
        &strings(&["styles/legacy/**"]),
    )
    .unwrap();

    assert!(profile.matches("styles/main.scss"));
    assert!(!profile.matches("styles/legacy/old.scss"));
    assert_eq!(profile.name(), "styles");
}

#[test]
fn test_watch_roots_drop_nested_directories() {
    let profiles = vec![
        TaskWatchProfile::new("a", &strings(&["scripts/**/*.js"]), &[]).unwrap(),
        TaskWatchProfile::new("b", &strings(&["scripts/vendor/**/*"]), &[]).unwrap(),
        TaskWatchProfile::new("c", &strings(&["styles/*.scss"]), &[]).unwrap(),
    ];

    assert_eq!(
        watch_roots(&profiles),
        [PathBuf::from("scripts"), PathBuf::from("styles")]
    );
}

#[test]
fn test_collect_matching_files_walks_base_dirs() {
    let fs = MockFileSystem::new();
    fs.add_file("/dev/styles/main.scss", "a");
    fs.add_file("/dev/styles/parts/_x.scss", "b");
    fs.add_file("/dev/styles/notes.txt", "c");
    fs.add_file("/dev/scripts/app.js", "d");

    let profile = TaskWatchProfile::new("styles", &strings(&["styles/**/*.scss"]), &[]).unwrap();
    let files = collect_matching_files(&fs, Path::new("/dev"), &profile).unwrap();

    assert_eq!(
        files,
        [
            PathBuf::from("/dev/styles/main.scss"),
            PathBuf::from("/dev/styles/parts/_x.scss"),
        ]
    );
}

#[test]
fn test_content_hashes_report_only_real_changes() {
    let fs = MockFileSystem::new();
    let path = Path::new("/dev/styles/main.scss");
    fs.add_file(path, "a {}");

    let mut hashes = ContentHashes::new();
    hashes.seed(&fs, &[path.to_path_buf()]);
    assert_eq!(hashes.len(), 1);

    assert!(!hashes.changed(&fs, path));
    fs.add_file(path, "b {}");
    assert!(hashes.changed(&fs, path));
    assert!(!hashes.changed(&fs, path));

    // removed files always count as changed
    assert!(hashes.changed(&fs, Path::new("/dev/styles/gone.scss")));
}

#[test]
fn test_file_hash_is_stable_for_equal_content() {
    let fs = MockFileSystem::new();
    fs.add_file("/a.txt", "same");
    fs.add_file("/b.txt", "same");
    fs.add_file("/c.txt", "different");

    let a = compute_file_hash(&fs, Path::new("/a.txt")).unwrap();
    assert_eq!(a, compute_file_hash(&fs, Path::new("/b.txt")).unwrap());
    assert_ne!(a, compute_file_hash(&fs, Path::new("/c.txt")).unwrap());
    assert_eq!(a.len(), 64);
}

#[tokio::test]
async fn test_change_triggers_every_bound_task_once() {
    let fs = MockFileSystem::new();
    fs.add_file("/dev/partials/header.html", "<header/>");
    let profiles = build_profiles_from_config(&preset_config().unwrap()).unwrap();
    let (tx, mut rx) = mpsc::channel(16);

    let keep = process_file_change(
        &fs,
        Path::new("/dev"),
        Path::new("/dev/partials/header.html"),
        &profiles,
        &tx,
        None,
    )
    .await;

    assert!(keep);
    assert_eq!(drain(&mut rx), ["html", "styles"]);
}

#[tokio::test]
async fn test_unchanged_content_triggers_nothing_with_hashing() {
    let fs = MockFileSystem::new();
    let path = Path::new("/dev/styles/main.scss");
    fs.add_file(path, "a {}");
    let profiles = build_profiles_from_config(&preset_config().unwrap()).unwrap();
    let (tx, mut rx) = mpsc::channel(16);

    let mut hashes = ContentHashes::new();
    hashes.seed(&fs, &[path.to_path_buf()]);

    process_file_change(&fs, Path::new("/dev"), path, &profiles, &tx, Some(&mut hashes)).await;
    assert!(drain(&mut rx).is_empty());

    fs.add_file(path, "b {}");
    process_file_change(&fs, Path::new("/dev"), path, &profiles, &tx, Some(&mut hashes)).await;
    assert_eq!(drain(&mut rx), ["styles"]);
}

#[tokio::test]
async fn test_closed_runtime_channel_stops_processing() {
    let fs = MockFileSystem::new();
    fs.add_file("/dev/scripts/app.js", "x");
    let profiles = build_profiles_from_config(&preset_config().unwrap()).unwrap();
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let keep = process_file_change(
        &fs,
        Path::new("/dev"),
        Path::new("/dev/scripts/app.js"),
        &profiles,
        &tx,
        None,
    )
    .await;
    assert!(!keep);
}

#[test]
fn test_relative_str_uses_forward_slashes() {
    assert_eq!(
        relative_str(Path::new("/dev"), Path::new("/dev/styles/main.scss")).as_deref(),
        Some("styles/main.scss")
    );
}

#[test]
fn test_access_events_are_not_relevant() {
    use notify::event::{AccessKind, CreateKind, EventKind};

    assert!(!is_relevant(&EventKind::Access(AccessKind::Any)));
    assert!(!is_relevant(&EventKind::Other));
    assert!(is_relevant(&EventKind::Create(CreateKind::File)));
}
