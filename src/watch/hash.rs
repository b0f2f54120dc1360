// src/watch/hash.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;

/// Hash a file's contents with BLAKE3, returning the hex digest.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs.read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Last seen content hash per watched file.
///
/// Used to drop events that did not change a file's content, such as a
/// save without edits or a metadata-only touch.
#[derive(Debug, Default)]
pub struct ContentHashes {
    hashes: HashMap<PathBuf, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record current hashes without reporting changes.
    pub fn seed(&mut self, fs: &dyn FileSystem, paths: &[PathBuf]) {
        for path in paths {
            if let Ok(hash) = compute_file_hash(fs, path) {
                self.hashes.insert(path.clone(), hash);
            }
        }
    }

    /// Whether `path` changed since it was last seen, updating the record.
    ///
    /// Removed or unreadable files always count as changed.
    pub fn changed(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        match compute_file_hash(fs, path) {
            Ok(hash) => match self.hashes.insert(path.to_path_buf(), hash.clone()) {
                Some(previous) if previous == hash => {
                    debug!(?path, "content hash unchanged");
                    false
                }
                _ => true,
            },
            Err(_) => {
                self.hashes.remove(path);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
