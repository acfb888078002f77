#[cfg(test)]
#[path = "voice_input_test.rs"]
mod tests;

use tokio::sync::mpsc;

use crate::domain::models::Capability;
use crate::domain::models::CaptureBox;
use crate::domain::models::CaptureErrorKind;
use crate::domain::models::CaptureEvent;
use crate::domain::models::CaptureState;
use crate::domain::models::VoiceError;
use crate::domain::models::VoiceMode;

/// What a capture event means to the rest of the assistant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    Started,
    Interim(String),
    /// A final transcript. In continuous mode it should be submitted, in
    /// push-to-talk mode it has already been appended to the pending input.
    Final(String),
    Failed(CaptureErrorKind),
    /// The session is over. `restart` is set when continuous mode wants the
    /// microphone back after the cooldown.
    Ended {
        restart: bool,
    },
}

/// Owns the single capture session of the device.
pub struct VoiceInput {
    capture: Capability<CaptureBox>,
    tx: mpsc::UnboundedSender<CaptureEvent>,
    state: CaptureState,
    mode: VoiceMode,
    interim: String,
    pending: String,
    has_final: bool,
    stop_requested: bool,
    fatal_error: bool,
}

impl VoiceInput {
    pub fn new(
        capture: Capability<CaptureBox>,
        mode: VoiceMode,
        tx: mpsc::UnboundedSender<CaptureEvent>,
    ) -> VoiceInput {
        return VoiceInput {
            capture,
            tx,
            state: CaptureState::Idle,
            mode,
            interim: "".to_string(),
            pending: "".to_string(),
            has_final: false,
            stop_requested: false,
            fatal_error: false,
        };
    }

    pub fn state(&self) -> CaptureState {
        return self.state;
    }

    pub fn mode(&self) -> VoiceMode {
        return self.mode;
    }

    pub fn is_supported(&self) -> bool {
        return self.capture.is_available();
    }

    pub fn interim(&self) -> &str {
        return &self.interim;
    }

    pub fn pending(&self) -> &str {
        return &self.pending;
    }

    /// Hands over the text collected by push-to-talk and clears it.
    pub fn take_pending(&mut self) -> String {
        return std::mem::take(&mut self.pending);
    }

    pub fn was_stopped(&self) -> bool {
        return self.stop_requested;
    }

    pub async fn set_mode(&mut self, mode: VoiceMode) {
        self.mode = mode;
        if mode == VoiceMode::Off {
            self.stop().await;
        }
    }

    /// Opens the microphone. Calling it while a session is already active is
    /// a no-op, as is calling it with voice turned off.
    pub async fn start(&mut self, locale: &str) -> Result<(), VoiceError> {
        if self.mode == VoiceMode::Off {
            tracing::debug!("Voice is off, ignoring capture start");
            return Ok(());
        }

        let Some(capture) = self.capture.get() else {
            return Err(VoiceError::CaptureUnsupported);
        };

        if self.state != CaptureState::Idle {
            tracing::debug!(state = %self.state, "Capture already active");
            return Ok(());
        }

        self.state = CaptureState::Starting;
        self.has_final = false;
        self.stop_requested = false;
        self.fatal_error = false;

        if let Err(err) = capture.start(locale, self.tx.clone()).await {
            tracing::error!(error = ?err, locale, "Failed to start speech capture");
            self.state = CaptureState::Idle;
            self.interim.clear();
            return Err(VoiceError::Capture(CaptureErrorKind::Other(err.to_string())));
        }

        return Ok(());
    }

    /// Asks the host to end capture. Idempotent when nothing is listening.
    pub async fn stop(&mut self) {
        if self.state != CaptureState::Starting && self.state != CaptureState::Listening {
            return;
        }

        self.stop_requested = true;
        self.state = CaptureState::Stopping;

        if let Some(capture) = self.capture.get() {
            if let Err(err) = capture.stop().await {
                tracing::warn!(error = ?err, "Failed to stop speech capture");
            }
        }
    }

    pub fn handle(&mut self, event: CaptureEvent) -> Option<CaptureOutcome> {
        match event {
            CaptureEvent::Started => {
                if self.state == CaptureState::Idle {
                    return None;
                }
                if self.state == CaptureState::Starting {
                    self.state = CaptureState::Listening;
                }
                return Some(CaptureOutcome::Started);
            }
            CaptureEvent::Interim(text) => {
                if self.state == CaptureState::Idle {
                    return None;
                }
                self.interim = text.to_string();
                return Some(CaptureOutcome::Interim(text));
            }
            CaptureEvent::Final(text) => {
                self.interim.clear();
                if self.state == CaptureState::Idle || text.trim().is_empty() {
                    return None;
                }

                if self.mode == VoiceMode::PushToTalk {
                    // One press, one transcript.
                    if self.has_final {
                        return None;
                    }
                    if !self.pending.is_empty() && !self.pending.ends_with(char::is_whitespace) {
                        self.pending += " ";
                    }
                    self.pending += text.trim();
                }

                self.has_final = true;
                return Some(CaptureOutcome::Final(text.trim().to_string()));
            }
            CaptureEvent::Error(kind) => {
                tracing::warn!(kind = %kind, "Speech capture error");
                self.interim.clear();
                self.state = CaptureState::Idle;
                if matches!(
                    kind,
                    CaptureErrorKind::PermissionDenied | CaptureErrorKind::AudioCapture
                ) {
                    self.fatal_error = true;
                }
                return Some(CaptureOutcome::Failed(kind));
            }
            CaptureEvent::Ended => {
                self.interim.clear();
                self.state = CaptureState::Idle;
                let restart = self.mode == VoiceMode::Continuous
                    && !self.stop_requested
                    && !self.fatal_error;
                return Some(CaptureOutcome::Ended { restart });
            }
        }
    }
}
