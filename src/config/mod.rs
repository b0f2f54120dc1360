// src/config/mod.rs

//! Configuration: TOML model, loading, validation and the built-in preset.

pub mod loader;
pub mod model;
pub mod paths;
pub mod preset;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str, resolve_config, LoadedConfig};
pub use model::{
    ConfigFile, ConfigSection, RawConfigFile, SassStyle, ScriptTarget, ServerSection, StageConfig, StageKind,
    TaskConfig, WatchSection,
};
pub use paths::ProjectPaths;
pub use preset::preset_config;
