#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use std::fmt;

use thiserror::Error;

/// Host speech-capture error kinds, parsed from the recognizer's error code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureErrorKind {
    NoSpeech,
    PermissionDenied,
    AudioCapture,
    Network,
    Aborted,
    Other(String),
}

impl fmt::Display for CaptureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CaptureErrorKind::NoSpeech => return write!(f, "no-speech"),
            CaptureErrorKind::PermissionDenied => return write!(f, "permission-denied"),
            CaptureErrorKind::AudioCapture => return write!(f, "audio-capture"),
            CaptureErrorKind::Network => return write!(f, "network"),
            CaptureErrorKind::Aborted => return write!(f, "aborted"),
            CaptureErrorKind::Other(code) => return write!(f, "{code}"),
        }
    }
}

impl CaptureErrorKind {
    pub fn parse(code: &str) -> CaptureErrorKind {
        match code.trim() {
            "no-speech" => return CaptureErrorKind::NoSpeech,
            "not-allowed" | "permission-denied" | "service-not-allowed" => {
                return CaptureErrorKind::PermissionDenied
            }
            "audio-capture" => return CaptureErrorKind::AudioCapture,
            "network" => return CaptureErrorKind::Network,
            "aborted" => return CaptureErrorKind::Aborted,
            other => return CaptureErrorKind::Other(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("speech capture is not supported on this device")]
    CaptureUnsupported,
    #[error("speech capture failed: {0}")]
    Capture(CaptureErrorKind),
    #[error("playback failed: {0}")]
    Playback(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("history unavailable: {0}")]
    History(String),
}
