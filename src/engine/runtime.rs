// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::server::LiveReload;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// IO shell around [`CoreRuntime`]: reads events from the channel, feeds
/// them to the core and carries out the returned commands.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reload: Option<LiveReload>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("reload", &self.reload.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reload: None,
        }
    }

    /// Notify these live-reload clients after successful runs.
    pub fn with_reload(mut self, reload: LiveReload) -> Self {
        self.reload = Some(reload);
        self
    }

    /// Main event loop. Returns when the channel closes, on shutdown, or
    /// when the core asks to exit.
    pub async fn run(mut self) -> Result<()> {
        info!("watch dispatcher started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("stopping watch dispatcher");
                return Ok(());
            }
        }

        info!("runtime event channel closed; exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTask(task) => {
                debug!(task = %task, "dispatching");
                self.executor.dispatch(task).await?;
            }
            CoreCommand::NotifyReload => {
                if let Some(reload) = &self.reload {
                    let clients = reload.notify();
                    debug!(clients, "sent live reload");
                }
            }
            CoreCommand::RequestExit => {
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }
}
