// src/types.rs

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// Build environment selected once at startup.
///
/// - `Development`: debug aids (source maps, readable markup) are emitted.
/// - `Production`: debug aids are dropped and size-reducing stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildEnv {
    Development,
    Production,
}

impl BuildEnv {
    pub fn is_development(self) -> bool {
        self == BuildEnv::Development
    }

    pub fn is_production(self) -> bool {
        self == BuildEnv::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildEnv::Development => "development",
            BuildEnv::Production => "production",
        }
    }
}

impl Default for BuildEnv {
    fn default() -> Self {
        BuildEnv::Development
    }
}

impl fmt::Display for BuildEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(BuildEnv::Development),
            "production" | "prod" => Ok(BuildEnv::Production),
            other => Err(format!(
                "invalid build environment: {other} (expected \"development\" or \"production\")"
            )),
        }
    }
}

/// Resolve the active environment.
///
/// Order: explicit CLI value, `SITEPIPE_ENV`, the config file, then the
/// default (`development`). An unparsable `SITEPIPE_ENV` is ignored.
pub fn resolve_env(cli: Option<BuildEnv>, config: Option<BuildEnv>) -> BuildEnv {
    cli.or_else(|| {
        std::env::var("SITEPIPE_ENV")
            .ok()
            .and_then(|s| s.parse().ok())
    })
    .or(config)
    .unwrap_or_default()
}
