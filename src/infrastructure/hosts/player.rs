#[cfg(test)]
#[path = "player_test.rs"]
mod tests;

use std::path::Path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::CommandTemplate;
use crate::domain::models::AudioPlayer;

/// Runs `child` to completion, killing it as soon as `cancel` fires.
/// Cancellation is not an error.
pub async fn run_cancellable(mut cmd: Command, cancel: CancellationToken) -> Result<()> {
    let mut child = cmd.spawn()?;

    tokio::select! {
        status = child.wait() => {
            let status = status?;
            if !status.success() {
                bail!(format!("Process exited with {status}"));
            }
        }
        _ = cancel.cancelled() => {
            child.kill().await?;
        }
    }

    return Ok(());
}

/// Plays backend audio through an external player, e.g. `mpv --no-video {file}`.
pub struct CommandPlayer {
    command: CommandTemplate,
}

impl CommandPlayer {
    pub fn new(command: CommandTemplate) -> CommandPlayer {
        return CommandPlayer { command };
    }

    async fn play_file(&self, path: &Path, cancel: CancellationToken) -> Result<()> {
        let file = path.to_string_lossy().to_string();
        let mut cmd = self.command.command(&[("file", file.to_string())]);
        if !self.command.uses("file") {
            cmd.arg(&file);
        }

        return run_cancellable(cmd, cancel).await;
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    #[allow(clippy::implicit_return)]
    async fn play(&self, audio: Vec<u8>, cancel: CancellationToken) -> Result<()> {
        let path = std::env::temp_dir().join(format!("mitron-{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, audio).await?;

        let res = self.play_file(&path, cancel).await;

        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::debug!(error = ?err, path = ?path, "Failed to remove audio clip");
        }

        return res;
    }
}
