// src/pipeline/asset.rs

use std::path::{Path, PathBuf};

use crate::pipeline::stage::{StageError, StageResult};

/// A source file that contributed to an asset.
///
/// `contents` holds the original text (before any stage ran) and is `None`
/// for binary files. Source maps embed it as `sourcesContent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Path relative to the source root, e.g. `styles/main.scss`.
    pub path: PathBuf,
    pub contents: Option<String>,
}

impl Origin {
    pub fn new(path: impl Into<PathBuf>, contents: Option<String>) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Position mappings from an asset's current text back to the text a
/// compiler read. `mappings` is a source map v3 VLQ string over a single
/// source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapping {
    pub source: PathBuf,
    pub content: String,
    pub mappings: String,
}

/// One file flowing through a task's stage chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Output path relative to the task's destination directory.
    pub path: PathBuf,
    pub contents: Vec<u8>,
    /// First entry is the file this asset was read from, if any.
    pub origins: Vec<Origin>,
    /// Set by stages that track positions; cleared whenever the text changes.
    pub mapping: Option<SourceMapping>,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            origins: Vec::new(),
            mapping: None,
        }
    }

    /// Build an asset read from `source` (relative to the source root).
    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        let text = String::from_utf8(contents.clone()).ok();
        Self {
            path: path.into(),
            contents,
            origins: vec![Origin::new(source, text)],
            mapping: None,
        }
    }

    /// The file this asset was read from, relative to the source root.
    pub fn source(&self) -> Option<&Path> {
        self.origins.first().map(|o| o.path.as_path())
    }

    /// Path used in error messages: the source if known, else the output path.
    pub fn display_path(&self) -> PathBuf {
        self.source().unwrap_or(&self.path).to_path_buf()
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> StageResult<&str> {
        std::str::from_utf8(&self.contents).map_err(|e| {
            StageError::for_file(self.display_path(), format!("file is not valid UTF-8: {e}"))
        })
    }

    pub fn set_text(&mut self, text: String) {
        self.contents = text.into_bytes();
        self.mapping = None;
    }

    /// Replace the text together with the mapping that describes it.
    pub fn set_mapped_text(&mut self, text: String, mapping: SourceMapping) {
        self.contents = text.into_bytes();
        self.mapping = Some(mapping);
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    pub fn set_extension(&mut self, extension: &str) {
        self.path.set_extension(extension);
    }

    /// Record an extra contributing file, skipping duplicates.
    pub fn add_origin(&mut self, origin: Origin) {
        if !self.origins.iter().any(|o| o.path == origin.path) {
            self.origins.push(origin);
        }
    }
}
