// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{resolve_config, ConfigFile, ProjectPaths};
use crate::dag::DagGraph;
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::RealExecutorBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::{clean_output, run_build, BuildReport, OnFailure, TaskRegistry};
use crate::server::LiveReload;
use crate::types::{resolve_env, BuildEnv};

/// High-level entry point used by `main.rs`.
///
/// Resolves the configuration and environment once, then runs the
/// requested command.
pub async fn run(args: CliArgs) -> Result<()> {
    let loaded = resolve_config(args.config.as_deref())?;
    let cfg = loaded.config;
    let env = resolve_env(args.env, cfg.config.env);
    let paths = ProjectPaths::new(&loaded.project_root, &cfg);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.dry_run {
        print_dry_run(&cfg, &paths, env);
        return Ok(());
    }

    let command = args.command();
    info!(?command, %env, root = %paths.project_root.display(), "starting");

    if command == Command::Clean {
        if !clean_output(fs.as_ref(), &paths.output_root)? {
            println!("sitepipe: nothing to clean");
        }
        return Ok(());
    }

    paths.ensure_source_root(fs.as_ref())?;
    let registry = Arc::new(TaskRegistry::from_config(&cfg, paths, env, fs)?);

    match command {
        Command::Build => build(&cfg, registry).await?.settle(OnFailure::Exit),
        Command::Watch => watch(&cfg, registry, None).await,
        Command::Server => serve_and_watch(&cfg, registry).await,
        Command::Default => {
            build(&cfg, Arc::clone(&registry)).await?.settle(OnFailure::Continue)?;
            serve_and_watch(&cfg, registry).await
        }
        Command::Clean => Ok(()),
    }
}

/// Run every task once and print the report.
async fn build(cfg: &ConfigFile, registry: Arc<TaskRegistry>) -> Result<BuildReport> {
    let jobs = cfg.config.jobs.unwrap_or_else(|| cfg.tasks().len());
    let report = run_build(registry, DagGraph::from_config(cfg), jobs).await?;
    print_build_report(&report);
    Ok(report)
}

/// Run the watch dispatcher until Ctrl-C.
async fn watch(cfg: &ConfigFile, registry: Arc<TaskRegistry>, reload: Option<LiveReload>) -> Result<()> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(Arc::clone(&registry), rt_tx.clone());

    let profiles = crate::watch::build_profiles_from_config(cfg)?;
    let _watcher_handle = crate::watch::spawn_watcher(
        registry.paths().source_root.clone(),
        profiles,
        rt_tx.clone(),
        crate::watch::WatchOptions::from(&cfg.watch),
        registry.fs(),
    )?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    println!("sitepipe: watching {}", registry.paths().source_root.display());

    let core = CoreRuntime::new(registry.names(), RuntimeOptions::default());
    let mut runtime = Runtime::new(core, rt_rx, executor);
    if let Some(reload) = reload {
        runtime = runtime.with_reload(reload);
    }
    runtime.run().await?;
    Ok(())
}

/// Dev server plus watch dispatcher. Either one stopping ends both.
async fn serve_and_watch(cfg: &ConfigFile, registry: Arc<TaskRegistry>) -> Result<()> {
    let reload = LiveReload::new();
    let paths = registry.paths().clone();
    let source_root = registry.env().is_development().then_some(paths.source_root.as_path());
    let app = server::router(&paths.output_root, source_root, reload.clone());

    tokio::select! {
        res = server::serve(&cfg.server.host, cfg.server.port, app) => res?,
        res = watch(cfg, Arc::clone(&registry), Some(reload)) => res?,
    }
    Ok(())
}

fn print_build_report(report: &BuildReport) {
    for task in &report.succeeded {
        println!("  built   {} ({} files)", task.task, task.written.len());
    }
    for (task, err) in &report.failed {
        println!("  FAILED  {task}: {err}");
    }
    for task in &report.skipped {
        println!("  skipped {task} (dependency failed)");
    }
    for conflict in &report.conflicts {
        println!("  CONFLICT {conflict}");
    }
}

/// Print the resolved settings and declared tasks without running anything.
fn print_dry_run(cfg: &ConfigFile, paths: &ProjectPaths, env: BuildEnv) {
    println!("sitepipe dry-run");
    println!("  env = {env}");
    println!("  source_root = {}", paths.source_root.display());
    println!("  output_root = {}", paths.output_root.display());
    println!("  server = {}:{}", cfg.server.host, cfg.server.port);
    println!("  watch.use_hash = {}", cfg.watch.use_hash);
    println!("  watch.debounce_ms = {}", cfg.watch.debounce_ms);
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks() {
        println!("  - {name}");
        println!("      src: {:?}", task.src);
        if !task.exclude.is_empty() {
            println!("      exclude: {:?}", task.exclude);
        }
        println!("      dest: {}", paths.dest_dir(&task.dest).display());
        let stages: Vec<&str> = task
            .stages
            .iter()
            .filter(|s| s.applies_to(env))
            .map(|s| s.kind.name())
            .collect();
        if stages.is_empty() {
            println!("      stages: (copy)");
        } else {
            println!("      stages: {}", stages.join(" -> "));
        }
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if let Some(ref watch) = task.watch {
            println!("      watch: {:?}", watch);
        }
    }

    debug!("dry-run complete (no execution)");
}
