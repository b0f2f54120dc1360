// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::BuildEnv;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// source_root = "dev"
/// output_root = "public"
///
/// [task.styles]
/// src = ["styles/*.scss"]
/// exclude = ["styles/_*.scss"]
/// dest = "css"
///
/// [[task.styles.stages]]
/// kind = "sass"
/// ```
///
/// All sections except `[task.*]` are optional and have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `config::validate`),
/// so holders can rely on: at least one task, valid globs, destinations
/// inside the output root, and an acyclic `after` graph.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub server: ServerSection,
    pub watch: WatchSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            server: raw.server,
            watch: raw.watch,
            task: raw.task,
        }
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Directory holding all sources, relative to the config file.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Directory all tasks write into, relative to the config file.
    /// `clean` removes it.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Environment used when neither `--env` nor `SITEPIPE_ENV` is set.
    #[serde(default)]
    pub env: Option<BuildEnv>,

    /// Worker pool size for `build`. `None` means one worker per task.
    #[serde(default)]
    pub jobs: Option<usize>,
}

fn default_source_root() -> String {
    "dev".to_string()
}

fn default_output_root() -> String {
    "public".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_root: default_output_root(),
            env: None,
            jobs: None,
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Skip triggers for events whose file content did not change.
    #[serde(default = "default_use_hash")]
    pub use_hash: bool,
    /// Quiet period, in milliseconds, that closes a batch of file events.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_use_hash() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            use_hash: default_use_hash(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Source globs, relative to the source root.
    pub src: Vec<String>,

    /// Globs removed from `src`.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Destination directory, relative to the output root.
    pub dest: String,

    /// Watch bindings. If `None`, the task watches its `src` globs.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Globs removed from `watch`. If `None`, `exclude` is used.
    #[serde(default)]
    pub watch_exclude: Option<Vec<String>>,

    /// Tasks that must succeed before this one starts during `build`.
    #[serde(default)]
    pub after: Vec<String>,

    /// Transformation chain, applied in order. Empty means copy.
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

impl TaskConfig {
    /// Effective watch globs.
    pub fn effective_watch(&self) -> &[String] {
        self.watch.as_deref().unwrap_or(&self.src)
    }

    /// Effective watch exclusion globs.
    pub fn effective_watch_exclude(&self) -> &[String] {
        self.watch_exclude.as_deref().unwrap_or(&self.exclude)
    }
}

/// One `[[task.<name>.stages]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    #[serde(flatten)]
    pub kind: StageKind,

    /// Only declare this stage in the given environment.
    #[serde(default)]
    pub only: Option<BuildEnv>,
}

impl StageConfig {
    pub fn new(kind: StageKind) -> Self {
        Self { kind, only: None }
    }

    pub fn only(mut self, env: BuildEnv) -> Self {
        self.only = Some(env);
        self
    }

    /// Whether this stage takes part in a build for `env`.
    pub fn applies_to(&self, env: BuildEnv) -> bool {
        self.only.map_or(true, |only| only == env)
    }
}

/// Stage kinds and their recognised options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
    /// Expand `@@include("file")` directives.
    Include {
        #[serde(default = "default_include_prefix")]
        prefix: String,
    },
    /// Render with MiniJinja.
    Template {
        #[serde(default)]
        extension: Option<String>,
        #[serde(default)]
        strict: Option<bool>,
    },
    /// Compile SCSS.
    Sass {
        #[serde(default)]
        style: Option<SassStyle>,
        #[serde(default)]
        load_paths: Vec<String>,
    },
    /// Add vendor-prefixed declarations.
    Autoprefix {},
    /// Parse, downlevel and re-emit JavaScript.
    Script {
        #[serde(default)]
        minify: Option<bool>,
        #[serde(default)]
        target: Option<ScriptTarget>,
    },
    /// Strip indentation and blank lines from HTML.
    HtmlMinify {},
    /// Merge SVG icons into a single symbol sprite.
    SvgSprite {
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        remove_style: Option<bool>,
    },
    /// Merge all files into one.
    Concat {
        output: String,
        #[serde(default)]
        separator: Option<String>,
    },
    /// Emit `.map` files for CSS/JS outputs.
    Sourcemap {},
    /// Pipe each file through an external command.
    Command {
        cmd: String,
        #[serde(default)]
        extension: Option<String>,
    },
}

/// Oldest ECMAScript edition the `script` stage emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptTarget {
    #[default]
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
}

fn default_include_prefix() -> String {
    "@@".to_string()
}

impl StageKind {
    /// Short name, as written in `kind = "..."`.
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Include { .. } => "include",
            StageKind::Template { .. } => "template",
            StageKind::Sass { .. } => "sass",
            StageKind::Autoprefix {} => "autoprefix",
            StageKind::Script { .. } => "script",
            StageKind::HtmlMinify {} => "html_minify",
            StageKind::SvgSprite { .. } => "svg_sprite",
            StageKind::Concat { .. } => "concat",
            StageKind::Sourcemap {} => "sourcemap",
            StageKind::Command { .. } => "command",
        }
    }
}

/// Output style for the `sass` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SassStyle {
    Expanded,
    Compressed,
}
