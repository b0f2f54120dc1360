// src/pipeline/source.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Compiled source patterns of a task.
///
/// Patterns are relative to the source root and use `/` separators. `*`
/// does not cross directory boundaries; `**` does.
#[derive(Clone)]
pub struct SourceSet {
    include: GlobSet,
    exclude: Option<GlobSet>,
    patterns: Vec<String>,
    base: PathBuf,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field("patterns", &self.patterns)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl SourceSet {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include_set = build_globset(include).context("building source globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        let base = common_base(include.iter().map(|p| glob_base(p)));

        Ok(Self {
            include: include_set,
            exclude: exclude_set,
            patterns: include.to_vec(),
            base,
        })
    }

    /// Directory (relative to the source root) output paths are relative to.
    ///
    /// For `scripts/*.js`, `scripts/app.js` is written as `app.js` under the
    /// task's destination.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a source-root-relative path (forward slashes) belongs to the set.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(rel_path),
            None => true,
        }
    }

    /// Collect matching files under `source_root`, sorted.
    ///
    /// Returns source-root-relative paths. A missing base directory yields
    /// an empty list.
    pub fn collect(&self, fs: &dyn FileSystem, source_root: &Path) -> Result<Vec<PathBuf>> {
        let files = fs
            .walk_files(&source_root.join(&self.base))?
            .into_iter()
            .filter_map(|path| {
                let rel = path.strip_prefix(source_root).ok()?;
                self.matches(&slash_path(rel)).then(|| rel.to_path_buf())
            })
            .collect();
        Ok(files)
    }
}

/// Render a relative path with forward slashes.
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Compile a pattern with `*` not matching `/`.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Leading directories of a pattern that contain no glob syntax.
///
/// `styles/*.scss` → `styles`, `scripts/libs.js` → `scripts`,
/// `**/*.js` → `` (the source root itself).
pub fn glob_base(pattern: &str) -> PathBuf {
    let parts: Vec<&str> = pattern.split('/').filter(|p| !p.is_empty()).collect();
    let literal = parts
        .iter()
        .take_while(|p| !p.contains(['*', '?', '[', '{']))
        .count();

    // A fully literal pattern names a file; its base is the parent.
    let take = if literal == parts.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };

    parts.iter().take(take).collect()
}

/// Longest shared leading path of `bases`.
pub fn common_base(bases: impl IntoIterator<Item = PathBuf>) -> PathBuf {
    let mut iter = bases.into_iter();
    let Some(first) = iter.next() else {
        return PathBuf::new();
    };

    let mut common: Vec<Component<'_>> = Vec::new();
    let first_components: Vec<_> = first.components().collect();
    common.extend(first_components.iter().copied());

    let rest: Vec<PathBuf> = iter.collect();
    for other in rest.iter() {
        let shared = common
            .iter()
            .zip(other.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }

    common.iter().collect()
}
