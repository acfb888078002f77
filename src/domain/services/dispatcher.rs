#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;

use anyhow::Result;

use super::translate;
use super::Phrase;
use super::Sessions;
use crate::domain::models::BackendBox;
use crate::domain::models::ChatReply;
use crate::domain::models::ChatRequest;
use crate::domain::models::Language;
use crate::domain::models::Message;
use crate::domain::models::VoiceError;

/// A chat turn whose user message is already in the log and whose request is
/// ready to go out.
#[derive(Clone, Debug)]
pub struct PendingDispatch {
    pub request: ChatRequest,
    pub epoch: u64,
}

/// The reply (or transport failure) of one chat turn.
#[derive(Debug)]
pub struct DispatchResult {
    pub epoch: u64,
    pub reply: Result<ChatReply>,
}

pub enum Begin {
    /// Nothing to send.
    Empty,
    /// Handled locally, no request was made.
    Offline,
    Request(PendingDispatch),
}

/// Turns submitted text into chat turns and folds replies back into the
/// active session.
pub struct Dispatcher {
    user_id: String,
    user_context: Option<serde_json::Value>,
    online: bool,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(user_id: &str, user_context: Option<serde_json::Value>) -> Dispatcher {
        return Dispatcher {
            user_id: user_id.to_string(),
            user_context,
            online: true,
            in_flight: 0,
        };
    }

    pub fn is_online(&self) -> bool {
        return self.online;
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn in_flight(&self) -> usize {
        return self.in_flight;
    }

    /// Appends the user message and assembles the request. Empty text is
    /// rejected without touching the log.
    pub fn begin(&mut self, text: &str, language: Language, sessions: &mut Sessions) -> Begin {
        if text.trim().is_empty() {
            return Begin::Empty;
        }

        sessions.push(Message::user(text));

        if !self.online {
            tracing::debug!("Offline, skipping chat request");
            sessions.push(Message::error(translate(language, Phrase::Offline)));
            return Begin::Offline;
        }

        self.in_flight += 1;
        return Begin::Request(PendingDispatch {
            request: ChatRequest {
                message: text.to_string(),
                language,
                user_id: self.user_id.to_string(),
                session_id: sessions.active_id().map(|e| return e.to_string()),
                user_context: self.user_context.clone(),
            },
            epoch: sessions.epoch(),
        });
    }

    pub async fn send(backend: BackendBox, pending: PendingDispatch) -> DispatchResult {
        let reply = backend.send_message(&pending.request).await;
        return DispatchResult {
            epoch: pending.epoch,
            reply,
        };
    }

    /// Appends the reply, or exactly one error message, and adopts the
    /// server's session id. Returns the reply text to voice.
    ///
    /// Replies for a conversation that has since been replaced are dropped.
    pub fn complete(
        &mut self,
        result: DispatchResult,
        language: Language,
        sessions: &mut Sessions,
    ) -> Option<String> {
        self.in_flight = self.in_flight.saturating_sub(1);

        if result.epoch != sessions.epoch() {
            tracing::debug!("Dropping reply for a session that is no longer active");
            return None;
        }

        let reply = match result.reply {
            Ok(reply) => reply,
            Err(err) => {
                let err = VoiceError::Dispatch(err.to_string());
                tracing::error!(error = %err, "Chat request failed");
                sessions.push(Message::error(translate(language, Phrase::ConnectionError)));
                return None;
            }
        };

        let text = match reply.reply {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                tracing::error!("Chat reply carried no text");
                sessions.push(Message::error(translate(language, Phrase::EmptyReply)));
                return None;
            }
        };

        sessions.push(Message::assistant(&text));
        sessions.adopt(reply.session_id);

        return Some(text);
    }
}
