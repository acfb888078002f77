mod capture;
mod command;
mod player;
mod synthesis;

use std::sync::Arc;

pub use capture::*;
pub use command::*;
pub use player::*;
pub use synthesis::*;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Capability;
use crate::domain::models::CaptureBox;
use crate::domain::models::PlayerBox;
use crate::domain::models::SynthesisBox;
use crate::domain::services::Hosts;

pub struct HostManager {}

impl HostManager {
    /// Resolves the host primitives from the configured commands. An empty
    /// command leaves the primitive unavailable.
    pub fn detect() -> Hosts {
        let capture = CommandTemplate::parse(&Config::get(ConfigKey::CaptureCommand))
            .map(|e| return Box::new(ProcessCapture::new(e)) as CaptureBox);
        let player = CommandTemplate::parse(&Config::get(ConfigKey::PlayerCommand))
            .map(|e| return Arc::new(CommandPlayer::new(e)) as PlayerBox);
        let synthesis = CommandTemplate::parse(&Config::get(ConfigKey::SynthesisCommand))
            .map(|e| return Arc::new(CommandSynthesis::new(e)) as SynthesisBox);

        tracing::debug!(
            capture = capture.is_some(),
            player = player.is_some(),
            synthesis = synthesis.is_some(),
            "Detected host primitives"
        );

        return Hosts {
            capture: Capability::from_option(capture),
            player: Capability::from_option(player),
            synthesis: Capability::from_option(synthesis),
        };
    }
}
