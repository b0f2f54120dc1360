// src/pipeline/stage.rs

//! The stage abstraction.
//!
//! A stage takes the task's current list of assets and returns a new list.
//! Stages never touch the output directory; the task writes the final list
//! once every stage succeeded.

use std::fmt::Debug;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::fs::FileSystem;
use crate::pipeline::asset::Asset;
use crate::types::BuildEnv;

/// A stage rejected its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StageError {
    /// Offending file, relative to the source root when known.
    pub file: Option<PathBuf>,
    pub message: String,
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file: None,
            message: message.into(),
        }
    }

    pub fn for_file(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            message: message.into(),
        }
    }
}

pub type StageResult<T> = std::result::Result<T, StageError>;

pub type StageFuture<'a> = Pin<Box<dyn Future<Output = StageResult<Vec<Asset>>> + Send + 'a>>;

/// What a stage may know about the task it runs in.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub task: String,
    pub env: BuildEnv,
    pub fs: Arc<dyn FileSystem>,
    pub source_root: PathBuf,
    /// `source_root` joined with the task's glob base.
    pub base_dir: PathBuf,
}

impl StageContext {
    /// Absolute path of the file an asset was read from.
    pub fn source_path(&self, asset: &Asset) -> PathBuf {
        match asset.source() {
            Some(src) => self.source_root.join(src),
            None => self.base_dir.join(&asset.path),
        }
    }
}

/// One transformation in a task's chain.
pub trait Stage: Send + Sync + Debug {
    /// Name as written in `kind = "..."`.
    fn name(&self) -> &'static str;

    fn apply<'a>(&'a self, assets: Vec<Asset>, ctx: &'a StageContext) -> StageFuture<'a>;
}

/// Wrap a synchronous result for stages that do no async IO.
pub fn ready<'a>(result: StageResult<Vec<Asset>>) -> StageFuture<'a> {
    Box::pin(std::future::ready(result))
}

/// Apply `f` to every asset, stopping at the first error.
pub fn map_each<F>(assets: Vec<Asset>, f: F) -> StageResult<Vec<Asset>>
where
    F: FnMut(Asset) -> StageResult<Asset>,
{
    assets.into_iter().map(f).collect()
}
