// src/config/validate.rs

use std::path::{Component, Path};

use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, StageKind, TaskConfig};
use crate::errors::{Result, SitepipeError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_task_paths(name, task)?;
        validate_task_patterns(name, task)?;
        validate_task_stages(name, task)?;
    }
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> SitepipeError {
    SitepipeError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let section = &cfg.config;

    if section.jobs == Some(0) {
        return Err(config_error("[config].jobs must be >= 1 (got 0)"));
    }
    if section.source_root.trim().is_empty() {
        return Err(config_error("[config].source_root must not be empty"));
    }
    if section.output_root.trim().is_empty() {
        return Err(config_error("[config].output_root must not be empty"));
    }

    let source = Path::new(&section.source_root);
    let output = Path::new(&section.output_root);
    if source.starts_with(output) || output.starts_with(source) {
        return Err(config_error(format!(
            "[config].source_root '{}' and output_root '{}' must not contain each other",
            section.source_root, section.output_root
        )));
    }

    Ok(())
}

fn validate_task_paths(name: &str, task: &TaskConfig) -> Result<()> {
    if task.src.is_empty() {
        return Err(config_error(format!(
            "task '{name}' must list at least one `src` pattern"
        )));
    }

    let dest = Path::new(&task.dest);
    let escapes = dest.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(config_error(format!(
            "task '{name}' has `dest = \"{}\"` outside the output root",
            task.dest
        )));
    }

    Ok(())
}

fn validate_task_patterns(name: &str, task: &TaskConfig) -> Result<()> {
    let all = task
        .src
        .iter()
        .chain(task.exclude.iter())
        .chain(task.effective_watch().iter())
        .chain(task.effective_watch_exclude().iter());

    for pattern in all {
        if let Err(err) = Glob::new(pattern) {
            return Err(config_error(format!(
                "task '{name}' has invalid glob pattern '{pattern}': {err}"
            )));
        }
    }
    Ok(())
}

fn validate_task_stages(name: &str, task: &TaskConfig) -> Result<()> {
    for stage in task.stages.iter() {
        match &stage.kind {
            StageKind::Include { prefix } if prefix.is_empty() => {
                return Err(config_error(format!(
                    "task '{name}': include stage needs a non-empty `prefix`"
                )));
            }
            StageKind::Concat { output, .. } => ensure_file_name(name, "concat", output)?,
            StageKind::SvgSprite {
                output: Some(output),
                ..
            } => ensure_file_name(name, "svg_sprite", output)?,
            StageKind::Command { cmd, .. } if cmd.trim().is_empty() => {
                return Err(config_error(format!(
                    "task '{name}': command stage needs a non-empty `cmd`"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn ensure_file_name(task: &str, stage: &str, output: &str) -> Result<()> {
    let path = Path::new(output);
    let plain = !output.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(config_error(format!(
            "task '{task}': {stage} stage has invalid `output` '{output}'"
        )));
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(SitepipeError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                node
            )))
        }
    }
}
