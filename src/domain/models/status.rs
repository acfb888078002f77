use serde_derive::Deserialize;
use serde_derive::Serialize;

/// What the assistant is doing right now. Exactly one value is active.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    #[default]
    Idle,
    Listening,
    Processing,
    Speaking,
}
