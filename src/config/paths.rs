// src/config/paths.rs

use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::fs::FileSystem;
use crate::errors::{Result, SitepipeError};

/// Absolute-ish locations every task resolves its globs and outputs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub project_root: PathBuf,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
}

impl ProjectPaths {
    pub fn new(project_root: impl Into<PathBuf>, cfg: &ConfigFile) -> Self {
        let project_root = project_root.into();
        Self {
            source_root: project_root.join(&cfg.config.source_root),
            output_root: project_root.join(&cfg.config.output_root),
            project_root,
        }
    }

    /// Fail with a configuration error if the source root is missing.
    pub fn ensure_source_root(&self, fs: &dyn FileSystem) -> Result<()> {
        if fs.is_dir(&self.source_root) {
            Ok(())
        } else {
            Err(SitepipeError::ConfigError(format!(
                "source root {:?} does not exist",
                self.source_root
            )))
        }
    }

    /// Output directory of a task with the given `dest`.
    pub fn dest_dir(&self, dest: &str) -> PathBuf {
        let dest = Path::new(dest);
        if dest == Path::new(".") || dest.as_os_str().is_empty() {
            self.output_root.clone()
        } else {
            self.output_root.join(dest)
        }
    }
}
