// tests/watch_rebuild.rs

mod common;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use common::site::write_preset_site;
use common::{init_tracing, with_timeout};
use sitepipe::config::{preset_config, ProjectPaths};
use sitepipe::dag::DagGraph;
use sitepipe::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use sitepipe::exec::RealExecutorBackend;
use sitepipe::fs::{FileSystem, RealFileSystem};
use sitepipe::pipeline::{run_build, TaskRegistry};
use sitepipe::server::LiveReload;
use sitepipe::types::BuildEnv;
use sitepipe::watch::{build_profiles_from_config, spawn_watcher, WatchOptions};

/// Contents of every file below `dir`, keyed by path relative to it.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let fs = RealFileSystem;
    fs.walk_files(dir)
        .unwrap()
        .into_iter()
        .map(|path| {
            let bytes = fs.read(&path).unwrap();
            (path.strip_prefix(dir).unwrap().to_path_buf(), bytes)
        })
        .collect()
}

#[tokio::test]
async fn watched_change_rebuilds_only_the_bound_task() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_preset_site(root);

    let cfg = preset_config().unwrap();
    let paths = ProjectPaths::new(root, &cfg);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let registry = Arc::new(
        TaskRegistry::from_config(&cfg, paths.clone(), BuildEnv::Development, Arc::clone(&fs))
            .unwrap(),
    );

    let report = run_build(Arc::clone(&registry), DagGraph::from_config(&cfg), 4)
        .await
        .unwrap();
    assert!(report.is_success(), "{report:?}");
    let before = snapshot(&paths.output_root);

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(Arc::clone(&registry), rt_tx.clone());
    let options = WatchOptions {
        use_hash: true,
        settle: Duration::from_millis(100),
    };
    let _watcher = spawn_watcher(
        paths.source_root.clone(),
        build_profiles_from_config(&cfg).unwrap(),
        rt_tx.clone(),
        options,
        fs,
    )
    .unwrap();

    let reload = LiveReload::new();
    let mut reloads = reload.subscribe();
    let core = CoreRuntime::new(registry.names(), RuntimeOptions::default());
    let runtime = tokio::spawn(Runtime::new(core, rt_rx, executor).with_reload(reload).run());

    sleep(Duration::from_millis(100)).await;
    std::fs::write(
        paths.source_root.join("scripts/app.js"),
        "// application entry\nconsole.log('changed');\n",
    )
    .unwrap();

    with_timeout(reloads.recv()).await.unwrap();

    let after = snapshot(&paths.output_root);
    assert_eq!(
        after.keys().collect::<Vec<_>>(),
        before.keys().collect::<Vec<_>>()
    );

    let app = String::from_utf8(after[Path::new("js/app.js")].clone()).unwrap();
    assert!(app.contains("changed"), "{app}");
    assert_ne!(after[Path::new("js/app.js.map")], before[Path::new("js/app.js.map")]);

    let rebuilt = [Path::new("js/app.js"), Path::new("js/app.js.map")];
    for (rel, bytes) in &before {
        if rebuilt.contains(&rel.as_path()) {
            continue;
        }
        assert_eq!(&after[rel], bytes, "{} changed", rel.display());
    }

    rt_tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    with_timeout(runtime).await.unwrap().unwrap();
}
