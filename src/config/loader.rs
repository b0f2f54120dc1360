// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::preset::preset_config;
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated `RawConfigFile`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Deserialize a configuration from TOML text.
pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks globs, destinations, stage options, `after` references and
///   cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// `Sitepipe.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sitepipe.toml")
}

/// A loaded configuration plus the directory its relative paths resolve
/// against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ConfigFile,
    pub project_root: PathBuf,
}

/// Resolve the configuration the CLI should use.
///
/// - An explicit path must exist.
/// - Without one, `Sitepipe.toml` is used if present, otherwise the
///   built-in preset rooted at the current directory.
pub fn resolve_config(explicit: Option<&str>) -> Result<LoadedConfig> {
    match explicit {
        Some(path) => {
            let path = PathBuf::from(path);
            let config = load_and_validate(&path)?;
            Ok(LoadedConfig {
                config,
                project_root: config_root_dir(&path),
            })
        }
        None => {
            let path = default_config_path();
            if path.is_file() {
                let config = load_and_validate(&path)?;
                Ok(LoadedConfig {
                    config,
                    project_root: config_root_dir(&path),
                })
            } else {
                info!("no {:?} found; using the built-in preset", path);
                Ok(LoadedConfig {
                    config: preset_config()?,
                    project_root: current_dir(),
                })
            }
        }
    }
}

/// Figure out the project root for a config file.
///
/// - If the config path has a non-empty parent (e.g. "site/Sitepipe.toml"),
///   that directory is used.
/// - A bare filename falls back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => current_dir(),
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
