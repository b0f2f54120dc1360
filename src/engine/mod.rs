// src/engine/mod.rs

//! Watch-mode dispatcher.
//!
//! Watchers and task runners send [`RuntimeEvent`]s over one channel. The
//! pure state machine in [`core`] decides what to run next; the async shell
//! in [`runtime`] executes its decisions.

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a single task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Requested directly, e.g. by a test or at startup.
    Manual,
    /// A watched file changed.
    FileWatch,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Stop once nothing is running and nothing is queued.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Ctrl-C.
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
