#[cfg(test)]
#[path = "voice_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

/// How the microphone is driven. Orthogonal to the interaction status.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    EnumVariantNames,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum VoiceMode {
    Off,
    #[default]
    PushToTalk,
    Continuous,
}

impl VoiceMode {
    pub fn parse(text: &str) -> Option<VoiceMode> {
        let text = text.trim();
        if text == "ptt" {
            return Some(VoiceMode::PushToTalk);
        }
        return VoiceMode::iter().find(|e| return e.to_string() == text);
    }
}

/// Rendering parameters for local speech synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub voice_index: usize,
}

impl Default for VoiceSettings {
    fn default() -> VoiceSettings {
        return VoiceSettings {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice_index: 0,
        };
    }
}

impl VoiceSettings {
    pub fn new(rate: f32, pitch: f32, volume: f32, voice_index: usize) -> VoiceSettings {
        return VoiceSettings {
            rate,
            pitch,
            volume,
            voice_index,
        }
        .clamped();
    }

    pub fn clamped(self) -> VoiceSettings {
        return VoiceSettings {
            rate: clamp_or(self.rate, 0.5, 2.0, 1.0),
            pitch: clamp_or(self.pitch, 0.0, 2.0, 1.0),
            volume: clamp_or(self.volume, 0.0, 1.0, 1.0),
            voice_index: self.voice_index,
        };
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        return fallback;
    }
    return value.clamp(min, max);
}
