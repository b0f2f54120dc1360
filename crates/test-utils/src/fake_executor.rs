use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sitepipe::engine::{RuntimeEvent, TaskName, TaskOutcome};
use sitepipe::errors::Result;
use sitepipe::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were dispatched, in order
/// - immediately reports `TaskCompleted` for each one, with `Success`
///   unless the task was marked as failing.
pub struct FakeExecutor {
    runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<TaskName>>>,
    outcomes: BTreeMap<TaskName, TaskOutcome>,
    auto_complete: bool,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<TaskName>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            outcomes: BTreeMap::new(),
            auto_complete: true,
        }
    }

    /// Report `Failed` for this task.
    pub fn failing(mut self, task: &str) -> Self {
        self.outcomes.insert(task.to_string(), TaskOutcome::Failed);
        self
    }

    /// Only record dispatches; the test sends completions itself.
    pub fn manual_completion(mut self) -> Self {
        self.auto_complete = false;
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn dispatch(&mut self, task: TaskName) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let outcome = self
            .outcomes
            .get(&task)
            .copied()
            .unwrap_or(TaskOutcome::Success);
        let auto_complete = self.auto_complete;

        Box::pin(async move {
            executed.lock().unwrap().push(task.clone());

            if auto_complete {
                tx.send(RuntimeEvent::TaskCompleted { task, outcome })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
