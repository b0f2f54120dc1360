// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::WatchSection;
use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::watch::debounce::next_batch;
use crate::watch::event_handler::process_file_change;
use crate::watch::hash::ContentHashes;
use crate::watch::patterns::{collect_matching_files, watch_roots, TaskWatchProfile};

/// Keeps the underlying notify watcher alive. Dropping it stops watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    watched: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Directories actually being watched.
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

/// How raw file events become triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Drop changes that leave a file's content hash as it was.
    pub use_hash: bool,
    /// Quiet period that closes a batch of events.
    pub settle: Duration,
}

impl From<&WatchSection> for WatchOptions {
    fn from(section: &WatchSection) -> Self {
        Self {
            use_hash: section.use_hash,
            settle: Duration::from_millis(section.debounce_ms),
        }
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::from(&WatchSection::default())
    }
}

/// Watch the bindings of `profiles` below `source_root` and send
/// `RuntimeEvent::TaskTriggered` for every matching change.
///
/// Each binding's base directory is watched recursively. A base directory
/// that cannot be watched is reported as a warning and skipped. Events are
/// batched per `options.settle` before any path is hashed or matched.
pub fn spawn_watcher(
    source_root: impl Into<PathBuf>,
    profiles: Vec<TaskWatchProfile>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    options: WatchOptions,
    fs: Arc<dyn FileSystem>,
) -> Result<WatcherHandle> {
    let root = source_root.into();
    let root = fs.canonicalize(&root).unwrap_or(root);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("sitepipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("sitepipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    let mut watched = Vec::new();
    for dir in watch_roots(&profiles) {
        let abs = root.join(&dir);
        if !fs.is_dir(&abs) {
            warn!(dir = %abs.display(), "watch directory does not exist; skipping");
            continue;
        }
        match watcher.watch(&abs, RecursiveMode::Recursive) {
            Ok(()) => watched.push(abs),
            Err(err) => warn!(dir = %abs.display(), error = %err, "cannot watch directory; skipping"),
        }
    }
    info!(root = %root.display(), dirs = watched.len(), "file watcher started");

    let mut hashes = if options.use_hash {
        let mut hashes = ContentHashes::new();
        for profile in &profiles {
            match collect_matching_files(fs.as_ref(), &root, profile) {
                Ok(files) => hashes.seed(fs.as_ref(), &files),
                Err(err) => warn!(task = profile.name(), error = %err, "cannot seed content hashes"),
            }
        }
        debug!(files = hashes.len(), "seeded content hashes");
        Some(hashes)
    } else {
        None
    };

    tokio::spawn(async move {
        while let Some(paths) = next_batch(&mut event_rx, options.settle).await {
            debug!(count = paths.len(), "settled file changes");

            for path in &paths {
                let keep_going = process_file_change(
                    fs.as_ref(),
                    &root,
                    path,
                    &profiles,
                    &runtime_tx,
                    hashes.as_mut(),
                )
                .await;
                if !keep_going {
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        watched,
    })
}
