#[cfg(test)]
#[path = "interaction_test.rs"]
mod tests;

use crate::domain::models::InteractionStatus;

/// Inputs to the status register, one per lifecycle edge of the controllers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusEvent {
    CaptureStarted,
    CaptureEnded,
    DispatchStarted,
    /// The last in-flight dispatch settled. `speaking` is true when the reply
    /// is being voiced, so processing hands over to speaking directly.
    DispatchFinished {
        speaking: bool,
    },
    SpeakInvoked,
    PlaybackFinished,
}

/// Single source of truth for what the assistant is doing. Whichever event
/// arrives last decides the status.
#[derive(Default)]
pub struct Interaction {
    status: InteractionStatus,
}

impl Interaction {
    pub fn status(&self) -> InteractionStatus {
        return self.status;
    }

    /// Applies `event` and returns the new status when it changed.
    pub fn apply(&mut self, event: StatusEvent) -> Option<InteractionStatus> {
        let next = match (self.status, event) {
            (_, StatusEvent::CaptureStarted) => InteractionStatus::Listening,
            (InteractionStatus::Listening, StatusEvent::CaptureEnded) => InteractionStatus::Idle,
            (_, StatusEvent::DispatchStarted) => InteractionStatus::Processing,
            (_, StatusEvent::DispatchFinished { speaking: true }) => InteractionStatus::Speaking,
            (InteractionStatus::Processing, StatusEvent::DispatchFinished { speaking: false }) => {
                InteractionStatus::Idle
            }
            (_, StatusEvent::SpeakInvoked) => InteractionStatus::Speaking,
            (InteractionStatus::Speaking, StatusEvent::PlaybackFinished) => {
                InteractionStatus::Idle
            }
            (current, _) => current,
        };

        if next == self.status {
            return None;
        }

        tracing::debug!(from = %self.status, to = %next, event = ?event, "Interaction status");
        self.status = next;
        return Some(next);
    }
}
