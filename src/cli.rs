// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::BuildEnv;

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build, watch and serve a static site's assets.",
    long_about = None
)]
pub struct CliArgs {
    /// What to do. Defaults to `default` (build, then serve and watch).
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the config file (TOML).
    ///
    /// When omitted and `Sitepipe.toml` does not exist in the current
    /// directory, the built-in preset is used.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Build environment (development or production).
    ///
    /// If omitted, `SITEPIPE_ENV`, then `[config].env`, then `development`
    /// is used.
    #[arg(long, global = true, value_enum, value_name = "ENV")]
    pub env: Option<BuildEnv>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the declared tasks, but don't run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl CliArgs {
    /// The subcommand to run, falling back to [`Command::Default`].
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Default)
    }
}

/// Process entry points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run every task once.
    Build,
    /// Re-run tasks when their watched files change.
    Watch,
    /// Remove the output root.
    Clean,
    /// Serve the output root with live reload, and watch.
    Server,
    /// Build, then serve and watch.
    Default,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
