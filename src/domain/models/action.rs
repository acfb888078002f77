use super::Language;
use super::VoiceMode;

/// Requests from the UI shell to the assistant.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    CaptureStart(),
    CaptureStop(),
    ListSessions(),
    LoadSession(String),
    NewSession(),
    SetLanguage(Language),
    SetOnline(bool),
    SetVoiceMode(VoiceMode),
    Speak(String),
    StopSpeaking(),
    Submit(String),
    SubmitPending(),
}
