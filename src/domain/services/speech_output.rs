#[cfg(test)]
#[path = "speech_output_test.rs"]
mod tests;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::models::BackendBox;
use crate::domain::models::Capability;
use crate::domain::models::Language;
use crate::domain::models::PlaybackEvent;
use crate::domain::models::PlayerBox;
use crate::domain::models::SynthesisBox;
use crate::domain::models::VoiceSettings;

/// Everything one utterance task needs, detached from the controller.
struct Utterance {
    id: u64,
    text: String,
    language: Language,
    settings: VoiceSettings,
    backend: Option<BackendBox>,
    player: Option<PlayerBox>,
    synthesis: Option<SynthesisBox>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl Utterance {
    fn send(&self, event: PlaybackEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Err(err) = self.tx.send(event) {
            tracing::warn!(error = ?err, "Playback listener is gone");
        }
    }

    async fn play_primary(&self) -> bool {
        let (Some(backend), Some(player)) = (&self.backend, &self.player) else {
            return false;
        };

        let audio = tokio::select! {
            res = backend.synthesize(&self.text, self.language) => res,
            _ = self.cancel.cancelled() => return true,
        };

        let audio = match audio {
            Ok(audio) => audio,
            Err(err) => {
                tracing::warn!(error = ?err, "Backend speech failed, falling back to local synthesis");
                return false;
            }
        };

        self.send(PlaybackEvent::Started(self.id));
        if let Err(err) = player.play(audio, self.cancel.clone()).await {
            tracing::warn!(error = ?err, "Audio playback failed, falling back to local synthesis");
            return false;
        }

        self.send(PlaybackEvent::Ended(self.id));
        return true;
    }

    async fn run(self) {
        if self.play_primary().await || self.cancel.is_cancelled() {
            return;
        }

        let Some(synthesis) = &self.synthesis else {
            self.send(PlaybackEvent::Failed(
                self.id,
                "no speech output available".to_string(),
            ));
            return;
        };

        self.send(PlaybackEvent::Started(self.id));
        let res = synthesis
            .speak(
                &self.text,
                self.language.locale(),
                &self.settings,
                self.cancel.clone(),
            )
            .await;

        match res {
            Ok(()) => self.send(PlaybackEvent::Ended(self.id)),
            Err(err) => {
                tracing::warn!(error = ?err, "Local speech synthesis failed");
                self.send(PlaybackEvent::Failed(self.id, err.to_string()));
            }
        }
    }
}

/// Outcome of a playback event for the live utterance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Started,
    Finished,
}

/// Owns the one playback slot of the device. A new utterance always cancels
/// the previous one first.
pub struct SpeechOutput {
    backend: BackendBox,
    player: Capability<PlayerBox>,
    synthesis: Capability<SynthesisBox>,
    tx: mpsc::UnboundedSender<PlaybackEvent>,
    settings: VoiceSettings,
    language: Language,
    online: bool,
    next_id: u64,
    current: Option<(u64, CancellationToken)>,
}

impl SpeechOutput {
    pub fn new(
        backend: BackendBox,
        player: Capability<PlayerBox>,
        synthesis: Capability<SynthesisBox>,
        settings: VoiceSettings,
        language: Language,
        tx: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> SpeechOutput {
        return SpeechOutput {
            backend,
            player,
            synthesis,
            tx,
            settings: settings.clamped(),
            language,
            online: true,
            next_id: 0,
            current: None,
        };
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn set_settings(&mut self, settings: VoiceSettings) {
        self.settings = settings.clamped();
    }

    pub fn settings(&self) -> VoiceSettings {
        return self.settings;
    }

    pub fn is_speaking(&self) -> bool {
        return self.current.is_some();
    }

    /// Starts voicing `text`. Returns false when no output path exists, in
    /// which case nothing plays and no error is raised.
    pub fn speak(&mut self, text: &str, language: Option<Language>) -> bool {
        self.stop();

        if text.trim().is_empty() {
            return false;
        }

        let use_primary = self.online && self.player.is_available();
        if !use_primary && !self.synthesis.is_available() {
            tracing::debug!("No speech output path available");
            return false;
        }

        self.next_id += 1;
        let cancel = CancellationToken::new();
        self.current = Some((self.next_id, cancel.clone()));

        let utterance = Utterance {
            id: self.next_id,
            text: text.to_string(),
            language: language.unwrap_or(self.language),
            settings: self.settings,
            backend: use_primary.then(|| return self.backend.clone()),
            player: self.player.get().filter(|_| return use_primary).cloned(),
            synthesis: self.synthesis.get().cloned(),
            cancel,
            tx: self.tx.clone(),
        };

        tracing::debug!(utterance = utterance.id, primary = use_primary, "Speaking");
        tokio::spawn(utterance.run());

        return true;
    }

    /// Cancels whatever is playing. Safe to call when idle. Returns the id of
    /// the cancelled utterance.
    pub fn stop(&mut self) -> Option<u64> {
        let (id, cancel) = self.current.take()?;
        cancel.cancel();
        tracing::debug!(utterance = id, "Cancelled utterance");
        return Some(id);
    }

    /// Maps an event to an outcome, dropping events of cancelled utterances.
    pub fn handle(&mut self, event: PlaybackEvent) -> Option<PlaybackOutcome> {
        let (id, _) = self.current.as_ref()?;
        if *id != event.utterance() {
            return None;
        }

        match event {
            PlaybackEvent::Started(_) => return Some(PlaybackOutcome::Started),
            PlaybackEvent::Ended(_) => {
                self.current = None;
                return Some(PlaybackOutcome::Finished);
            }
            PlaybackEvent::Failed(_, reason) => {
                tracing::warn!(reason, "Speech output degraded silently");
                self.current = None;
                return Some(PlaybackOutcome::Finished);
            }
        }
    }
}
