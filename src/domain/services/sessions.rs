#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use super::translate;
use super::Phrase;
use crate::domain::models::BackendBox;
use crate::domain::models::Language;
use crate::domain::models::Message;
use crate::domain::models::Session;

/// The active conversation: its server id (`None` until the backend mints
/// one), its message log, and the cached history list.
pub struct Sessions {
    active_id: Option<String>,
    messages: Vec<Message>,
    history: Vec<Session>,
    epoch: u64,
}

impl Sessions {
    pub fn new(language: Language) -> Sessions {
        return Sessions {
            active_id: None,
            messages: vec![Message::welcome(translate(language, Phrase::Welcome))],
            history: vec![],
            epoch: 0,
        };
    }

    pub fn active_id(&self) -> Option<&str> {
        return self.active_id.as_deref();
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn history(&self) -> &[Session] {
        return &self.history;
    }

    /// Bumped whenever the log is replaced, so late replies can tell whether
    /// the conversation they belong to is still on screen.
    pub fn epoch(&self) -> u64 {
        return self.epoch;
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Takes over a server-assigned id, but only while the active session is
    /// still unsaved. Returns true when the id was adopted.
    pub fn adopt(&mut self, session_id: Option<String>) -> bool {
        if self.active_id.is_some() {
            return false;
        }

        match session_id {
            Some(id) if !id.is_empty() => {
                tracing::debug!(session_id = id, "Adopted session id");
                self.active_id = Some(id);
                return true;
            }
            _ => return false,
        }
    }

    /// Applies a history fetch. On failure the previous list is kept, since
    /// history must never block chatting.
    pub fn apply_history(&mut self, res: Result<Vec<Session>>) -> &[Session] {
        match res {
            Ok(sessions) => self.history = sessions,
            Err(err) => {
                tracing::warn!(error = ?err, "Failed to fetch chat history, keeping cached list");
            }
        }

        return &self.history;
    }

    pub async fn list(&mut self, backend: &BackendBox, user_id: &str) -> Vec<Session> {
        let res = backend.list_sessions(user_id).await;
        return self.apply_history(res).to_vec();
    }

    /// Downloads a transcript and maps it to messages, without touching the
    /// active log.
    pub async fn fetch(backend: &BackendBox, session_id: &str) -> Result<Vec<Message>> {
        let transcript = backend.load_session(session_id).await?;
        if let Some(err) = transcript.error {
            bail!(format!("Failed to load session {session_id}: {err}"));
        }

        let Some(entries) = transcript.messages else {
            bail!(format!("Session {session_id} has no messages"));
        };

        return Ok(entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| return Message::from_history(idx, entry))
            .collect());
    }

    /// Swaps in a loaded transcript wholesale.
    pub fn replace(&mut self, session_id: &str, messages: Vec<Message>) {
        self.messages = messages;
        self.active_id = Some(session_id.to_string());
        self.epoch += 1;
    }

    pub async fn load(&mut self, backend: &BackendBox, session_id: &str) -> Result<&[Message]> {
        let messages = Sessions::fetch(backend, session_id).await?;
        self.replace(session_id, messages);
        return Ok(&self.messages);
    }

    pub fn start_new(&mut self, language: Language) {
        self.messages = vec![Message::welcome(translate(language, Phrase::Welcome))];
        self.active_id = None;
        self.epoch += 1;
    }
}
