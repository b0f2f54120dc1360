// src/pipeline/clean.rs

use std::path::Path;

use tracing::info;

use crate::errors::Result;
use crate::fs::FileSystem;

/// Remove the output root and everything below it.
///
/// Returns `false` when there was nothing to remove.
pub fn clean_output(fs: &dyn FileSystem, output_root: &Path) -> Result<bool> {
    if !fs.exists(output_root) {
        info!(path = %output_root.display(), "output root absent; nothing to clean");
        return Ok(false);
    }

    fs.remove_dir_all(output_root)?;
    info!(path = %output_root.display(), "removed output root");
    Ok(true)
}
