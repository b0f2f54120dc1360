// src/config/preset.rs

//! Built-in task set mirroring the conventional `dev/` → `public/` layout.

use crate::config::loader::load_from_str;
use crate::config::model::ConfigFile;
use crate::errors::Result;

/// TOML source of the preset; also printed by `--dry-run`.
pub const PRESET_TOML: &str = include_str!("preset.toml");

/// Parse and validate the built-in preset.
pub fn preset_config() -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_str(PRESET_TOML)?)
}
