#[cfg(test)]
#[path = "synthesis_test.rs"]
mod tests;

use std::process::Stdio;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use super::run_cancellable;
use super::CommandTemplate;
use crate::domain::models::SpeechSynthesis;
use crate::domain::models::VoiceSettings;

/// Placeholder values for a synthesis command. Scales follow espeak-ng:
/// words per minute, pitch 0-100 and amplitude 0-100.
pub fn synthesis_vars(
    text: &str,
    locale: &str,
    settings: &VoiceSettings,
) -> Vec<(&'static str, String)> {
    let settings = settings.clamped();
    let lang = locale.split('-').next().unwrap_or_default().to_string();

    return vec![
        ("text", text.to_string()),
        ("locale", locale.to_string()),
        ("lang", lang),
        ("rate", format!("{}", (settings.rate * 175.0).round() as u32)),
        ("pitch", format!("{}", (settings.pitch * 50.0).round() as u32)),
        ("volume", format!("{}", (settings.volume * 100.0).round() as u32)),
        ("voice", settings.voice_index.to_string()),
    ];
}

/// Local text to speech through an external engine. Without a `{text}`
/// placeholder the text is written to the engine's stdin.
pub struct CommandSynthesis {
    command: CommandTemplate,
}

impl CommandSynthesis {
    pub fn new(command: CommandTemplate) -> CommandSynthesis {
        return CommandSynthesis { command };
    }
}

#[async_trait]
impl SpeechSynthesis for CommandSynthesis {
    #[allow(clippy::implicit_return)]
    async fn speak(
        &self,
        text: &str,
        locale: &str,
        settings: &VoiceSettings,
        cancel: CancellationToken,
    ) -> Result<()> {
        let vars = synthesis_vars(text, locale, settings);
        let mut cmd = self.command.command(&vars);

        if self.command.uses("text") {
            return run_cancellable(cmd, cancel).await;
        }

        cmd.stdin(Stdio::piped());
        let mut child = cmd.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if !status.success() {
                    bail!(format!("Speech engine exited with {status}"));
                }
            }
            _ = cancel.cancelled() => {
                child.kill().await?;
            }
        }

        return Ok(());
    }
}
