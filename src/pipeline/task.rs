// src/pipeline/task.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::config::{ProjectPaths, TaskConfig};
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::pipeline::asset::Asset;
use crate::pipeline::source::SourceSet;
use crate::pipeline::stage::{Stage, StageContext, StageError};
use crate::pipeline::stages::build_stage;
use crate::types::BuildEnv;

/// Files one successful run of a task wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: String,
    /// Absolute output paths, in write order.
    pub written: Vec<PathBuf>,
}

/// A declared task: its sources, its stage chain and where it writes.
#[derive(Debug)]
pub struct Task {
    name: String,
    sources: SourceSet,
    stages: Vec<Box<dyn Stage>>,
    dest_dir: PathBuf,
    after: Vec<String>,
}

impl Task {
    /// Declare a task for `env`. Stages restricted to another environment
    /// are left out here, so runs never consult the environment again.
    pub fn declare(name: &str, cfg: &TaskConfig, paths: &ProjectPaths, env: BuildEnv) -> Result<Self> {
        let sources = SourceSet::new(&cfg.src, &cfg.exclude)
            .with_context(|| format!("task '{name}': invalid source patterns"))?;

        let stages = cfg
            .stages
            .iter()
            .filter(|stage| stage.applies_to(env))
            .map(|stage| {
                build_stage(stage, env).with_context(|| {
                    format!("task '{name}': cannot build stage '{}'", stage.kind.name())
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            sources,
            stages,
            dest_dir: paths.dest_dir(&cfg.dest),
            after: cfg.after.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn after(&self) -> &[String] {
        &self.after
    }

    /// Names of the declared stages, in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run the task once.
    ///
    /// Every stage must succeed before anything is written, so a failing
    /// run leaves the previous outputs in place.
    pub async fn run(
        &self,
        fs: Arc<dyn FileSystem>,
        env: BuildEnv,
        source_root: &Path,
    ) -> Result<TaskReport> {
        let files = self
            .sources
            .collect(fs.as_ref(), source_root)
            .with_context(|| format!("task '{}': enumerating sources", self.name))?;
        debug!(task = %self.name, count = files.len(), "collected sources");

        let mut assets = Vec::with_capacity(files.len());
        for rel in files {
            let contents = fs
                .read(&source_root.join(&rel))
                .with_context(|| format!("task '{}': reading {}", self.name, rel.display()))?;
            let out = rel.strip_prefix(self.sources.base()).unwrap_or(&rel).to_path_buf();
            assets.push(Asset::from_source(out, rel, contents));
        }

        let ctx = StageContext {
            task: self.name.clone(),
            env,
            fs: Arc::clone(&fs),
            source_root: source_root.to_path_buf(),
            base_dir: source_root.join(self.sources.base()),
        };

        for stage in &self.stages {
            debug!(task = %self.name, stage = stage.name(), assets = assets.len(), "applying stage");
            assets = stage
                .apply(assets, &ctx)
                .await
                .map_err(|e| self.transform_error(e))?;
        }

        let mut written = Vec::with_capacity(assets.len());
        for asset in assets {
            let target = self.dest_dir.join(&asset.path);
            fs.write(&target, &asset.contents)
                .with_context(|| format!("task '{}': writing output", self.name))?;
            written.push(target);
        }

        info!(task = %self.name, files = written.len(), "task finished");
        Ok(TaskReport {
            task: self.name.clone(),
            written,
        })
    }

    fn transform_error(&self, err: StageError) -> SitepipeError {
        SitepipeError::Transform {
            task: self.name.clone(),
            file: err.file,
            message: err.message,
        }
    }
}
