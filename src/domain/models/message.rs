#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
}

/// One chat bubble. Messages are never mutated once created, the log only
/// grows or is replaced wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: String,
    text: String,
    is_user: bool,
    timestamp: Option<DateTime<Utc>>,
    mtype: MessageType,
}

impl Message {
    fn create(is_user: bool, mtype: MessageType, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            is_user,
            timestamp: Some(Utc::now()),
            mtype,
        };
    }

    pub fn user(text: &str) -> Message {
        return Message::create(true, MessageType::Normal, text);
    }

    pub fn assistant(text: &str) -> Message {
        return Message::create(false, MessageType::Normal, text);
    }

    pub fn error(text: &str) -> Message {
        return Message::create(false, MessageType::Error, text);
    }

    pub fn welcome(text: &str) -> Message {
        return Message {
            id: "welcome".to_string(),
            text: text.to_string(),
            is_user: false,
            timestamp: None,
            mtype: MessageType::Normal,
        };
    }

    /// Maps a stored transcript entry. Position in the transcript becomes the
    /// id, matching how the history backend orders messages.
    pub fn from_history(idx: usize, entry: &HistoryMessage) -> Message {
        return Message {
            id: idx.to_string(),
            text: entry.content.to_string(),
            is_user: entry.role == "user",
            timestamp: entry.timestamp,
            mtype: MessageType::Normal,
        };
    }

    pub fn id(&self) -> &str {
        return &self.id;
    }

    pub fn text(&self) -> &str {
        return &self.text;
    }

    pub fn is_user(&self) -> bool {
        return self.is_user;
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        return self.timestamp;
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub content: String,
    pub role: String,
    #[serde(default, with = "crate::domain::models::timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}
