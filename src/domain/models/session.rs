#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::HistoryMessage;

fn default_title() -> String {
    return "New Chat".to_string();
}

/// Summary row of a persisted conversation, as returned by the history list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default, rename = "preview")]
    pub preview_text: String,
    #[serde(
        default,
        rename = "date",
        with = "crate::domain::models::timestamp"
    )]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Session {
    pub fn format(&self) -> String {
        let mut res = format!("(ID: {}) {}", self.id, self.title);
        if let Some(ts) = self.last_modified {
            res = format!("{res}, {}", ts.format("%Y-%m-%d %H:%M"));
        }

        let mut line = self
            .preview_text
            .split('\n')
            .next()
            .unwrap_or_default()
            .to_string();
        if line.chars().count() >= 70 {
            line = format!("{}...", line.chars().take(67).collect::<String>());
        }
        if !line.is_empty() {
            res = format!("{res}, {line}");
        }

        return res;
    }
}

/// Full transcript of a stored session. The history backend answers with an
/// `error` field instead of messages when the id is unknown.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionTranscript {
    #[serde(default)]
    pub messages: Option<Vec<HistoryMessage>>,
    #[serde(default)]
    pub error: Option<String>,
}
