#![allow(dead_code)]

use std::collections::BTreeMap;

use sitepipe::config::{
    ConfigFile, ConfigSection, RawConfigFile, ServerSection, StageConfig, StageKind, TaskConfig,
    WatchSection,
};
use sitepipe::errors::Result;
use sitepipe::types::BuildEnv;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                server: ServerSection::default(),
                watch: WatchSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn source_root(mut self, dir: &str) -> Self {
        self.config.config.source_root = dir.to_string();
        self
    }

    pub fn output_root(mut self, dir: &str) -> Self {
        self.config.config.output_root = dir.to_string();
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.config.jobs = Some(jobs);
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(src: &str, dest: &str) -> Self {
        Self {
            task: TaskConfig {
                src: vec![src.to_string()],
                exclude: vec![],
                dest: dest.to_string(),
                watch: None,
                watch_exclude: None,
                after: vec![],
                stages: vec![],
            },
        }
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.task.src.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.task.exclude.push(pattern.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.task
            .watch
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn watch_exclude(mut self, pattern: &str) -> Self {
        self.task
            .watch_exclude
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn stage(mut self, kind: StageKind) -> Self {
        self.task.stages.push(StageConfig::new(kind));
        self
    }

    pub fn stage_only(mut self, kind: StageKind, env: BuildEnv) -> Self {
        self.task.stages.push(StageConfig::new(kind).only(env));
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
