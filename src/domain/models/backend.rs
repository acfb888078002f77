#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Language;
use super::Session;
use super::SessionTranscript;

/// Body of one chat turn. `session_id` is always sent, `null` meaning the
/// backend should mint a new session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub language: Language,
    pub user_id: String,
    pub session_id: Option<String>,
    pub user_context: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[async_trait]
pub trait Backend {
    /// Used at startup to tell the farmer early when the assistant server
    /// can't be reached.
    async fn health_check(&self) -> Result<()>;

    /// Sends one chat turn and returns the parsed reply. A reply without text
    /// is returned as is, the caller decides how to report it.
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// Requests encoded audio for `text`.
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>>;

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>>;

    async fn load_session(&self, session_id: &str) -> Result<SessionTranscript>;
}

pub type BackendBox = Arc<dyn Backend + Send + Sync>;
