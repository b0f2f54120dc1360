// src/watch/patterns.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::config::ConfigFile;
use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::pipeline::source::{build_globset, glob_base, slash_path};

/// Compiled watch bindings of a single task.
///
/// Patterns are relative to the source root; the watcher passes relative
/// paths such as `"styles/_vars.scss"` into [`matches`](Self::matches).
#[derive(Clone)]
pub struct TaskWatchProfile {
    name: TaskName,
    patterns: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for TaskWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWatchProfile")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl TaskWatchProfile {
    pub fn new(name: impl Into<TaskName>, watch: &[String], exclude: &[String]) -> Result<Self> {
        let name = name.into();
        let watch_set = build_globset(watch)
            .with_context(|| format!("building watch globset for task {name}"))?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(exclude)
                    .with_context(|| format!("building watch exclude globset for task {name}"))?,
            )
        };

        Ok(Self {
            name,
            patterns: watch.to_vec(),
            watch_set,
            exclude_set,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a change to `rel_path` (source-root relative, `/`-separated)
    /// should trigger this task.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        match &self.exclude_set {
            Some(exclude) => !exclude.is_match(rel_path),
            None => true,
        }
    }

    /// Directories (source-root relative) that must be watched for this
    /// task's patterns.
    pub fn base_dirs(&self) -> Vec<PathBuf> {
        self.patterns.iter().map(|p| glob_base(p)).collect()
    }
}

/// One profile per task, from `watch`/`watch_exclude` (falling back to
/// `src`/`exclude`).
pub fn build_profiles_from_config(cfg: &ConfigFile) -> Result<Vec<TaskWatchProfile>> {
    cfg.tasks()
        .iter()
        .map(|(name, task)| {
            TaskWatchProfile::new(
                name.clone(),
                task.effective_watch(),
                task.effective_watch_exclude(),
            )
        })
        .collect()
}

/// Names of all tasks bound to `rel_path`, sorted and without duplicates.
pub fn tasks_for_path(profiles: &[TaskWatchProfile], rel_path: &str) -> Vec<TaskName> {
    profiles
        .iter()
        .filter(|p| p.matches(rel_path))
        .map(|p| p.name().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Minimal set of directories covering every profile's bases.
///
/// A directory nested inside another one in the set is dropped, since the
/// watch is recursive.
pub fn watch_roots(profiles: &[TaskWatchProfile]) -> Vec<PathBuf> {
    let all: BTreeSet<PathBuf> = profiles.iter().flat_map(|p| p.base_dirs()).collect();

    let mut roots: Vec<PathBuf> = Vec::new();
    for dir in all {
        if !roots.iter().any(|root| dir.starts_with(root)) {
            roots.push(dir);
        }
    }
    roots
}

/// Files under `root` that `profile` matches, as absolute paths.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    profile: &TaskWatchProfile,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for base in profile.base_dirs() {
        for path in fs.walk_files(&root.join(base))? {
            let matched = path
                .strip_prefix(root)
                .is_ok_and(|rel| profile.matches(&slash_path(rel)));
            if matched {
                files.push(path);
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
