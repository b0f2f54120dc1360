// src/exec/backend.rs

//! Pluggable executor backend.
//!
//! The runtime hands task names to an `ExecutorBackend`. Production uses
//! [`RealExecutorBackend`], which runs tasks from a [`TaskRegistry`]; tests
//! substitute a fake that records dispatches and reports completions itself.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::{RuntimeEvent, TaskName};
use crate::errors::{Error, Result};
use crate::pipeline::TaskRegistry;

use super::executor_loop::spawn_executor;

pub trait ExecutorBackend: Send {
    /// Start one run of `task`. Completion is reported as a
    /// `RuntimeEvent::TaskCompleted`, not through the returned future.
    fn dispatch(&mut self, task: TaskName) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Forwards dispatches to the background executor loop.
#[derive(Debug)]
pub struct RealExecutorBackend {
    tx: mpsc::Sender<TaskName>,
}

impl RealExecutorBackend {
    /// Spawns the executor loop immediately.
    pub fn new(registry: Arc<TaskRegistry>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(registry, runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn dispatch(&mut self, task: TaskName) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();
        Box::pin(async move {
            tx.send(task).await.map_err(Error::from)?;
            Ok(())
        })
    }
}
