// src/pipeline/build.rs

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::dag::{DagGraph, Scheduler};
use crate::engine::TaskOutcome;
use crate::errors::{Result, SitepipeError};
use crate::pipeline::registry::TaskRegistry;
use crate::pipeline::task::TaskReport;

/// Outcome of a full `build`.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub succeeded: Vec<TaskReport>,
    pub failed: Vec<(String, SitepipeError)>,
    /// Tasks not run because an `after` dependency failed.
    pub skipped: Vec<String>,
    /// Output files written by more than one task.
    pub conflicts: Vec<SitepipeError>,
}

/// What a failed build means for the command that ran it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// `build`: the process exits non-zero.
    Exit,
    /// `default`: keep serving and watching so the next save can fix it.
    Continue,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && self.conflicts.is_empty()
    }

    /// One-line summary of what went wrong, if anything did.
    pub fn failure_summary(&self) -> Option<String> {
        (!self.is_success()).then(|| {
            format!(
                "build failed: {} failed, {} skipped, {} output conflicts",
                self.failed.len(),
                self.skipped.len(),
                self.conflicts.len()
            )
        })
    }

    /// Turn the report into the command's result according to `on_failure`.
    pub fn settle(&self, on_failure: OnFailure) -> anyhow::Result<()> {
        let Some(summary) = self.failure_summary() else {
            return Ok(());
        };
        match on_failure {
            OnFailure::Exit => Err(anyhow!(summary)),
            OnFailure::Continue => {
                warn!("{summary}; continuing with the outputs that were written");
                Ok(())
            }
        }
    }
}

/// Run every declared task once on a pool of at most `jobs` workers.
///
/// Tasks start as soon as their `after` dependencies succeeded. A failure
/// does not stop unrelated tasks; its dependents are skipped.
pub async fn run_build(registry: Arc<TaskRegistry>, graph: DagGraph, jobs: usize) -> Result<BuildReport> {
    let jobs = jobs.max(1);
    let mut scheduler = Scheduler::new(graph);
    let mut report = BuildReport::default();

    let mut ready: VecDeque<String> = scheduler.start().into();
    let mut workers: JoinSet<(String, Result<TaskReport>)> = JoinSet::new();
    info!(jobs, "build started");

    loop {
        while workers.len() < jobs {
            let Some(name) = ready.pop_front() else {
                break;
            };
            let registry = Arc::clone(&registry);
            workers.spawn(async move {
                let result = registry.run(&name).await;
                (name, result)
            });
        }

        let Some(joined) = workers.join_next().await else {
            break;
        };
        let (name, result) = joined.map_err(|e| anyhow!("build worker panicked: {e}"))?;

        let outcome = match result {
            Ok(task_report) => {
                report.succeeded.push(task_report);
                TaskOutcome::Success
            }
            Err(err) => {
                error!(task = %name, error = %err, "task failed");
                report.failed.push((name.clone(), err));
                TaskOutcome::Failed
            }
        };

        let step = scheduler.complete(&name, outcome);
        for skipped in &step.newly_skipped {
            warn!(task = %skipped, because = %name, "skipping task after failed dependency");
        }
        report.skipped.extend(step.newly_skipped);
        ready.extend(step.newly_ready);
    }

    report.succeeded.sort_by(|a, b| a.task.cmp(&b.task));
    report.failed.sort_by(|a, b| a.0.cmp(&b.0));
    report.skipped.sort();
    report.conflicts = find_conflicts(&report.succeeded);

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "build finished"
    );
    Ok(report)
}

/// Output paths claimed by two tasks.
fn find_conflicts(reports: &[TaskReport]) -> Vec<SitepipeError> {
    let mut owners: BTreeMap<&PathBuf, &str> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for report in reports {
        for path in &report.written {
            match owners.get(path) {
                Some(first) if *first != report.task => {
                    conflicts.push(SitepipeError::OutputConflict {
                        path: path.clone(),
                        first: first.to_string(),
                        second: report.task.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    owners.insert(path, &report.task);
                }
            }
        }
    }

    conflicts
}
