// src/pipeline/registry.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::config::{ConfigFile, ProjectPaths};
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::pipeline::clean::clean_output;
use crate::pipeline::task::{Task, TaskReport};
use crate::types::BuildEnv;

/// All declared tasks of a project, ready to run by name.
#[derive(Debug)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Task>,
    paths: ProjectPaths,
    env: BuildEnv,
    fs: Arc<dyn FileSystem>,
    /// Outputs each task wrote on its last successful run.
    last_written: Mutex<HashMap<String, BTreeSet<PathBuf>>>,
}

impl TaskRegistry {
    /// Declare every task of `cfg` for `env`.
    pub fn from_config(
        cfg: &ConfigFile,
        paths: ProjectPaths,
        env: BuildEnv,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for (name, task_cfg) in cfg.tasks() {
            tasks.insert(name.clone(), Task::declare(name, task_cfg, &paths, env)?);
        }
        Ok(Self {
            tasks,
            paths,
            env,
            fs,
            last_written: Mutex::new(HashMap::new()),
        })
    }

    /// Task names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn env(&self) -> BuildEnv {
        self.env
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn fs(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    /// Run one task by name.
    ///
    /// After a successful run, files the task wrote last time but no longer
    /// produces (a deleted source, an emptied sprite) are removed. Only the
    /// task's own earlier outputs are touched.
    pub async fn run(&self, name: &str) -> Result<TaskReport> {
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| SitepipeError::TaskNotFound(name.to_string()))?;
        let report = task.run(self.fs(), self.env, &self.paths.source_root).await?;
        self.prune_stale(&report);
        Ok(report)
    }

    fn prune_stale(&self, report: &TaskReport) {
        let current: BTreeSet<PathBuf> = report.written.iter().cloned().collect();
        let previous = match self.last_written.lock() {
            Ok(mut last) => last.insert(report.task.clone(), current.clone()),
            Err(_) => {
                warn!(task = %report.task, "output bookkeeping unavailable, skipping prune");
                return;
            }
        };

        for stale in previous.unwrap_or_default().difference(&current) {
            if !self.fs.is_file(stale) {
                continue;
            }
            match self.fs.remove_file(stale) {
                Ok(()) => debug!(task = %report.task, path = %stale.display(), "removed stale output"),
                Err(e) => warn!(task = %report.task, error = %e, "cannot remove stale output"),
            }
        }
    }

    /// Remove the output root. See [`clean_output`].
    pub fn clean(&self) -> Result<bool> {
        clean_output(self.fs.as_ref(), &self.paths.output_root)
    }
}
