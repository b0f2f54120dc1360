// src/watch/event_handler.rs

//! Turn filesystem events into task triggers.

use std::path::Path;

use notify::EventKind;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::hash::ContentHashes;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{tasks_for_path, TaskWatchProfile};

/// Access and unclassified events never change content.
pub fn is_relevant(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_) | EventKind::Other)
}

/// Trigger every task bound to `path`.
///
/// With `hashes`, a file whose content hash did not change triggers
/// nothing. Returns `false` once the runtime channel is closed.
pub async fn process_file_change(
    fs: &dyn FileSystem,
    root: &Path,
    path: &Path,
    profiles: &[TaskWatchProfile],
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    hashes: Option<&mut ContentHashes>,
) -> bool {
    let Some(rel) = relative_str(root, path) else {
        warn!(?path, ?root, "could not relativize event path");
        return true;
    };

    let tasks = tasks_for_path(profiles, &rel);
    if tasks.is_empty() {
        return true;
    }

    if fs.is_dir(path) {
        return true;
    }

    if let Some(hashes) = hashes {
        if !hashes.changed(fs, path) {
            debug!(path = %rel, "content unchanged; not triggering");
            return true;
        }
    }

    for task in tasks {
        debug!(task = %task, path = %rel, "watch match -> triggering task");
        if runtime_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::FileWatch,
            })
            .await
            .is_err()
        {
            warn!("runtime channel closed; stopping watcher");
            return false;
        }
    }

    true
}
