// src/exec/executor_loop.rs

//! Executor loop that runs dispatched tasks on Tokio tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::{RuntimeEvent, TaskName};
use crate::exec::runner::run_task;
use crate::pipeline::TaskRegistry;

/// Spawn the background executor loop and return its input channel.
///
/// Each dispatched task runs in its own Tokio task. Runs of the same task
/// name are chained: a new run waits for the previous one to finish, so
/// there is never more than one in flight per name.
pub fn spawn_executor(
    registry: Arc<TaskRegistry>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<TaskName> {
    let (tx, mut rx) = mpsc::channel::<TaskName>(32);

    tokio::spawn(async move {
        info!("executor loop started");
        let mut active: HashMap<TaskName, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            let previous = active.remove(&task).filter(|h| !h.is_finished());
            if previous.is_some() {
                debug!(task = %task, "previous run still active; chaining");
            }

            let registry = Arc::clone(&registry);
            let runtime_tx = runtime_tx.clone();
            let name = task.clone();
            let handle = tokio::spawn(async move {
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                run_task(&registry, name, runtime_tx).await;
            });

            active.insert(task, handle);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
