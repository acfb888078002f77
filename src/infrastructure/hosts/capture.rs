#[cfg(test)]
#[path = "capture_test.rs"]
mod tests;

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::CommandTemplate;
use crate::domain::models::CaptureErrorKind;
use crate::domain::models::CaptureEvent;
use crate::domain::models::SpeechCapture;

/// How long a recognizer gets to flush its last result after stdin closes.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// One JSON line printed by the recognizer.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum CaptureLine {
    Started,
    Interim { text: String },
    Final { text: String },
    Error { error: String },
    Ended,
}

/// Maps a recognizer output line to an event. Plain text lines count as
/// final transcripts, so simple line based recognizers work as is.
pub fn parse_line(line: &str) -> Option<CaptureEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if !line.starts_with('{') {
        return Some(CaptureEvent::Final(line.to_string()));
    }

    match serde_json::from_str::<CaptureLine>(line) {
        Ok(CaptureLine::Interim { text }) => return Some(CaptureEvent::Interim(text)),
        Ok(CaptureLine::Final { text }) => return Some(CaptureEvent::Final(text)),
        Ok(CaptureLine::Error { error }) => {
            return Some(CaptureEvent::Error(CaptureErrorKind::parse(&error)))
        }
        Ok(CaptureLine::Started) | Ok(CaptureLine::Ended) => return None,
        Err(err) => {
            tracing::warn!(error = ?err, line, "Unreadable recognizer output");
            return None;
        }
    }
}

struct Running {
    stdin: Option<ChildStdin>,
    stop: CancellationToken,
}

/// Speech capture backed by an external recognizer process. The process is
/// started with the locale, prints results on stdout, and is asked to finish
/// by closing its stdin.
pub struct ProcessCapture {
    command: CommandTemplate,
    running: Arc<Mutex<Option<Running>>>,
}

impl ProcessCapture {
    pub fn new(command: CommandTemplate) -> ProcessCapture {
        return ProcessCapture {
            command,
            running: Arc::new(Mutex::new(None)),
        };
    }
}

fn send(tx: &mpsc::UnboundedSender<CaptureEvent>, event: CaptureEvent) -> bool {
    if let Err(err) = tx.send(event) {
        tracing::debug!(error = ?err, "Capture listener is gone");
        return false;
    }
    return true;
}

async fn read_events(
    mut child: Child,
    stdout: ChildStdout,
    stop: CancellationToken,
    tx: mpsc::UnboundedSender<CaptureEvent>,
    running: Arc<Mutex<Option<Running>>>,
) {
    let mut lines = BufReader::new(stdout).lines();
    let deadline = async {
        stop.cancelled().await;
        tokio::time::sleep(STOP_GRACE).await;
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Some(event) = parse_line(&line) {
                        if !send(&tx, event) {
                            break;
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(error = ?err, "Failed to read recognizer output");
                    send(&tx, CaptureEvent::Error(CaptureErrorKind::AudioCapture));
                    break;
                }
            },
            _ = &mut deadline => {
                tracing::warn!("Recognizer did not exit after stop, killing it");
                break;
            }
        }
    }

    if let Err(err) = child.start_kill() {
        tracing::debug!(error = ?err, "Recognizer already exited");
    }
    match child.wait().await {
        Ok(status) => tracing::debug!(status = ?status, "Recognizer exited"),
        Err(err) => tracing::warn!(error = ?err, "Failed to wait for recognizer"),
    }

    running.lock().await.take();
    send(&tx, CaptureEvent::Ended);
}

#[async_trait]
impl SpeechCapture for ProcessCapture {
    #[allow(clippy::implicit_return)]
    async fn start(&self, locale: &str, tx: mpsc::UnboundedSender<CaptureEvent>) -> Result<()> {
        let mut running = self.running.lock().await;
        if let Some(previous) = running.as_mut() {
            previous.stdin.take();
            previous.stop.cancel();
            bail!("Recognizer is still finishing the previous session");
        }

        let lang = locale.split('-').next().unwrap_or_default().to_string();
        let mut child = self
            .command
            .command(&[("locale", locale.to_string()), ("lang", lang)])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| return anyhow!("Recognizer has no stdout"))?;
        let stop = CancellationToken::new();
        *running = Some(Running {
            stdin: child.stdin.take(),
            stop: stop.clone(),
        });

        tracing::debug!(program = self.command.program(), locale, "Started recognizer");
        send(&tx, CaptureEvent::Started);
        tokio::spawn(read_events(child, stdout, stop, tx, self.running.clone()));

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stop(&self) -> Result<()> {
        if let Some(running) = self.running.lock().await.as_mut() {
            running.stdin.take();
            running.stop.cancel();
        }

        return Ok(());
    }
}
