// src/pipeline/mod.rs

//! Task execution: sources, stages and the output tree.
//!
//! A task collects its source files into [`Asset`]s, passes them through its
//! stage chain and writes the result below its destination directory.

pub mod asset;
pub mod build;
pub mod clean;
pub mod registry;
pub mod source;
pub mod stage;
pub mod stages;
pub mod task;

pub use asset::{Asset, Origin, SourceMapping};
pub use build::{run_build, BuildReport, OnFailure};
pub use clean::clean_output;
pub use registry::TaskRegistry;
pub use source::SourceSet;
pub use stage::{Stage, StageContext, StageError, StageResult};
pub use task::{Task, TaskReport};
