// src/dag/scheduler.rs

//! Pure scheduler for a single `build`.
//!
//! Tracks which tasks are waiting, running or finished and decides what may
//! start next. It performs no IO; `pipeline::build` drives it.

use std::collections::BTreeMap;

use tracing::debug;

use crate::dag::graph::DagGraph;
use crate::engine::{TaskName, TaskOutcome};

/// Per-build state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on `after` dependencies.
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    /// Not run because a dependency failed or was skipped.
    Skipped,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::DoneSuccess | RunState::DoneFailed | RunState::Skipped
        )
    }
}

/// What changed after a task finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks whose dependencies are now all satisfied; the caller starts them.
    pub newly_ready: Vec<TaskName>,
    /// Tasks that will not run because of this completion.
    pub newly_skipped: Vec<TaskName>,
    /// Every task reached a terminal state.
    pub finished: bool,
}

#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    states: BTreeMap<TaskName, RunState>,
}

impl Scheduler {
    pub fn new(graph: DagGraph) -> Self {
        let states = graph
            .tasks()
            .map(|name| (name.to_string(), RunState::Pending))
            .collect();
        Self { graph, states }
    }

    pub fn state_of(&self, task: &str) -> Option<RunState> {
        self.states.get(task).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.states.values().all(|s| s.is_terminal())
    }

    /// Mark every task without dependencies as running and return them.
    pub fn start(&mut self) -> Vec<TaskName> {
        let ready: Vec<TaskName> = self
            .states
            .iter()
            .filter(|(name, state)| {
                **state == RunState::Pending && self.graph.dependencies_of(name).is_empty()
            })
            .map(|(name, _)| name.clone())
            .collect();

        for name in &ready {
            self.states.insert(name.clone(), RunState::Running);
        }
        debug!(?ready, "build started");
        ready
    }

    /// Record the outcome of a running task.
    ///
    /// Completions for tasks that are not running are ignored.
    pub fn complete(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        if self.states.get(task) != Some(&RunState::Running) {
            debug!(task, "ignoring completion of a task that is not running");
            step.finished = self.is_finished();
            return step;
        }

        match outcome {
            TaskOutcome::Success => {
                self.states.insert(task.to_string(), RunState::DoneSuccess);
                for dependent in self.graph.dependents_of(task).to_vec() {
                    if self.is_ready(&dependent) {
                        self.states.insert(dependent.clone(), RunState::Running);
                        step.newly_ready.push(dependent);
                    }
                }
            }
            TaskOutcome::Failed => {
                self.states.insert(task.to_string(), RunState::DoneFailed);
                self.skip_dependents(task, &mut step.newly_skipped);
            }
        }

        step.newly_ready.sort();
        step.newly_skipped.sort();
        step.finished = self.is_finished();
        step
    }

    fn is_ready(&self, task: &str) -> bool {
        self.states.get(task) == Some(&RunState::Pending)
            && self
                .graph
                .dependencies_of(task)
                .iter()
                .all(|dep| self.states.get(dep) == Some(&RunState::DoneSuccess))
    }

    fn skip_dependents(&mut self, task: &str, skipped: &mut Vec<TaskName>) {
        let mut stack: Vec<String> = self.graph.dependents_of(task).to_vec();
        while let Some(name) = stack.pop() {
            if self.states.get(&name) == Some(&RunState::Pending) {
                self.states.insert(name.clone(), RunState::Skipped);
                stack.extend(self.graph.dependents_of(&name).iter().cloned());
                skipped.push(name);
            }
        }
    }
}
