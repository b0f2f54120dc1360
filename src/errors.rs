// src/errors.rs

//! Crate-wide error type and aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A stage rejected its input. `message` is the collaborator's own
    /// error text, unmodified.
    #[error("task '{task}' failed{}: {message}", display_file(.file))]
    Transform {
        task: String,
        file: Option<PathBuf>,
        message: String,
    },

    #[error("output {path:?} is written by both '{first}' and '{second}'")]
    OutputConflict {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_file(file: &Option<PathBuf>) -> String {
    match file {
        Some(path) => format!(" on {}", path.display()),
        None => String::new(),
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
