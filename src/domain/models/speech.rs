use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::VoiceSettings;

/// Playback progress for one utterance, tagged with the utterance number so
/// events from a cancelled utterance can be told apart from the live one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started(u64),
    Ended(u64),
    Failed(u64, String),
}

impl PlaybackEvent {
    pub fn utterance(&self) -> u64 {
        match self {
            PlaybackEvent::Started(id) => return *id,
            PlaybackEvent::Ended(id) => return *id,
            PlaybackEvent::Failed(id, _) => return *id,
        }
    }
}

/// Plays an encoded audio clip returned by the speech backend.
#[async_trait]
pub trait AudioPlayer {
    /// Resolves when playback finishes. Cancelling `cancel` must stop the
    /// audio and return promptly.
    async fn play(&self, audio: Vec<u8>, cancel: CancellationToken) -> Result<()>;
}

/// Host-local text to speech, used when the backend cannot voice a reply.
#[async_trait]
pub trait SpeechSynthesis {
    async fn speak(
        &self,
        text: &str,
        locale: &str,
        settings: &VoiceSettings,
        cancel: CancellationToken,
    ) -> Result<()>;
}

pub type PlayerBox = Arc<dyn AudioPlayer + Send + Sync>;
pub type SynthesisBox = Arc<dyn SpeechSynthesis + Send + Sync>;
