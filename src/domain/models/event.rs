use super::InteractionStatus;
use super::Language;
use super::Message;
use super::Session;
use super::VoiceError;
use super::VoiceMode;

/// Notifications from the assistant to the UI shell.
#[derive(Debug)]
pub enum Event {
    ConnectivityChanged(bool),
    InterimTranscript(String),
    LanguageChanged(Language),
    MessageAdded(Message),
    MessagesReplaced(Vec<Message>),
    PendingInput(String),
    SessionChanged(Option<String>),
    SessionsListed(Vec<Session>),
    StatusChanged(InteractionStatus),
    VoiceError(VoiceError),
    VoiceModeChanged(VoiceMode),
}
