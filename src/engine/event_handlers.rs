// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a run of this task.
    DispatchTask(TaskName),
    /// Tell live-reload clients the output changed.
    NotifyReload,
    /// Nothing left to do and `exit_when_idle` is set.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a trigger.
///
/// - Unknown tasks are ignored with a warning.
/// - A task that is already running is queued for exactly one rerun.
/// - Otherwise the task is dispatched right away; other tasks may be
///   running concurrently.
pub fn handle_task_trigger(
    known: &BTreeSet<TaskName>,
    running: &mut BTreeSet<TaskName>,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    if !known.contains(&task) {
        warn!(task = %task, "trigger for unknown task ignored");
        return CoreStep::continue_with(Vec::new());
    }

    if running.contains(&task) {
        debug!(task = %task, ?reason, "task running; queueing rerun");
        queue.record_trigger(&task);
        return CoreStep::continue_with(Vec::new());
    }

    debug!(task = %task, ?reason, "dispatching task");
    running.insert(task.clone());
    CoreStep::continue_with(vec![CoreCommand::DispatchTask(task)])
}

/// Handle a finished run.
///
/// A successful run asks for a live reload. A queued rerun is dispatched
/// immediately, so the task never has two runs in flight.
pub fn handle_task_completion(
    running: &mut BTreeSet<TaskName>,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    if !running.remove(&task) {
        debug!(task = %task, "completion for a task that is not running; ignoring");
    } else {
        if outcome == TaskOutcome::Success {
            commands.push(CoreCommand::NotifyReload);
        }
        if queue.take(&task) {
            debug!(task = %task, "starting queued rerun");
            running.insert(task.clone());
            commands.push(CoreCommand::DispatchTask(task));
        }
    }

    let mut keep_running = true;
    if options.exit_when_idle && running.is_empty() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
