use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::CaptureErrorKind;

/// Lifecycle notifications from a host recognizer, delivered in order on the
/// channel handed to [`SpeechCapture::start`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
    Started,
    /// Cumulative partial transcript of the current utterance.
    Interim(String),
    Final(String),
    Error(CaptureErrorKind),
    Ended,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CaptureState {
    #[default]
    Idle,
    Starting,
    Listening,
    Stopping,
}

#[async_trait]
pub trait SpeechCapture {
    /// Begins one recognition session for `locale`. Returns once the host has
    /// accepted the request, all further progress is reported through `tx`
    /// and every session ends with [`CaptureEvent::Ended`].
    async fn start(&self, locale: &str, tx: mpsc::UnboundedSender<CaptureEvent>) -> Result<()>;

    /// Asks the host to finish the current session. Pending results are still
    /// delivered before `Ended`.
    async fn stop(&self) -> Result<()>;
}

pub type CaptureBox = Box<dyn SpeechCapture + Send + Sync>;
