// src/exec/runner.rs

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::engine::{RuntimeEvent, TaskName, TaskOutcome};
use crate::pipeline::TaskRegistry;

/// Run one task and report the outcome to the runtime.
///
/// Failures are printed for the operator; watching continues either way.
pub async fn run_task(registry: &TaskRegistry, task: TaskName, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let started = Instant::now();
    info!(task = %task, "running task");

    let outcome = match registry.run(&task).await {
        Ok(report) => {
            info!(
                task = %task,
                files = report.written.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "task succeeded"
            );
            TaskOutcome::Success
        }
        Err(err) => {
            error!(task = %task, error = %err, "task failed");
            eprintln!("sitepipe: {err}");
            TaskOutcome::Failed
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        info!(task = %task, "runtime gone; dropping completion");
    }
}
