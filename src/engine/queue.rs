// src/engine/queue.rs

use std::collections::BTreeSet;

use crate::engine::TaskName;

/// Tasks that were triggered while already running.
///
/// Repeated triggers coalesce: however many arrive during a run, the task
/// runs once more afterwards.
#[derive(Debug, Default, Clone)]
pub struct TriggerQueue {
    pending: BTreeSet<TaskName>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_trigger(&mut self, task: &str) {
        self.pending.insert(task.to_string());
    }

    /// Remove `task` from the queue, returning whether it was queued.
    pub fn take(&mut self, task: &str) -> bool {
        self.pending.remove(task)
    }

    pub fn contains(&self, task: &str) -> bool {
        self.pending.contains(task)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
