// src/pipeline/stages/command.rs

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::pipeline::asset::Asset;
use crate::pipeline::source::slash_path;
use crate::pipeline::stage::{Stage, StageContext, StageError, StageFuture, StageResult};

/// Pipes each asset through a shell command: contents on stdin, result on
/// stdout.
///
/// The command sees `SITEPIPE_FILE` (source-relative path) and
/// `SITEPIPE_ENV`. A non-zero exit fails the task with the command's stderr.
#[derive(Debug)]
pub struct CommandStage {
    cmd: String,
    extension: Option<String>,
}

impl CommandStage {
    pub fn new(cmd: String, extension: Option<String>) -> Self {
        Self { cmd, extension }
    }

    fn shell(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        }
    }

    async fn pipe(&self, mut asset: Asset, ctx: &StageContext) -> StageResult<Asset> {
        let file = asset.display_path();
        debug!(task = %ctx.task, file = %file.display(), cmd = %self.cmd, "running command stage");

        let mut child = self
            .shell()
            .current_dir(&ctx.source_root)
            .env("SITEPIPE_FILE", slash_path(&file))
            .env("SITEPIPE_ENV", ctx.env.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| StageError::for_file(file.clone(), format!("cannot spawn '{}': {e}", self.cmd)))?;

        // stdin is written concurrently with reading stdout
        let stdin = child.stdin.take();
        let input = std::mem::take(&mut asset.contents);
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                // Commands may legitimately exit without reading everything.
                let _ = stdin.write_all(&input).await;
            }
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| StageError::for_file(file.clone(), format!("waiting for '{}': {e}", self.cmd)))?;
        let _ = writer.await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let message = if stderr.trim().is_empty() {
                format!("'{}' exited with {}", self.cmd, output.status)
            } else {
                stderr
            };
            return Err(StageError::for_file(file, message));
        }

        asset.contents = output.stdout;
        asset.mapping = None;
        if let Some(ext) = &self.extension {
            asset.set_extension(ext);
        }
        Ok(asset)
    }
}

impl Stage for CommandStage {
    fn name(&self) -> &'static str {
        "command"
    }

    fn apply<'a>(&'a self, assets: Vec<Asset>, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(assets.len());
            for asset in assets {
                out.push(self.pipe(asset, ctx).await?);
            }
            Ok(out)
        })
    }
}
