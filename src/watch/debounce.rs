// src/watch/debounce.rs

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use notify::Event;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::watch::event_handler::is_relevant;

/// Wait for the next batch of changed paths.
///
/// A batch opens with the first relevant event and closes once `settle`
/// passes without another one. An editor's truncate followed by its write
/// therefore reaches the hash check once, with the final content. Paths
/// come back sorted and unique. Returns `None` when the channel closed with
/// nothing pending.
pub async fn next_batch(
    rx: &mut mpsc::UnboundedReceiver<Event>,
    settle: Duration,
) -> Option<Vec<PathBuf>> {
    let mut pending = BTreeSet::new();
    loop {
        let event = if pending.is_empty() {
            rx.recv().await
        } else {
            match timeout(settle, rx.recv()).await {
                Ok(event) => event,
                Err(_) => break,
            }
        };
        let Some(event) = event else {
            break;
        };
        if is_relevant(&event.kind) {
            pending.extend(event.paths);
        }
    }
    (!pending.is_empty()).then(|| pending.into_iter().collect())
}
