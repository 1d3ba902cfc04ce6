use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantModel {
    Client,
    Vendor,
}

impl ParticipantModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantModel::Client => "client",
            ParticipantModel::Vendor => "vendor",
        }
    }
}

/// One side of a conversation: a user id plus which collection it lives in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Participant {
    pub id: String,
    pub model: ParticipantModel,
}

impl Participant {
    pub fn new(id: impl Into<String>, model: ParticipantModel) -> Self {
        Self {
            id: id.into(),
            model,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(alias = "_id")]
    pub chat_id: String,
    pub sender_id: String,
    pub sender_model: ParticipantModel,
    pub receiver_id: String,
    pub receiver_model: ParticipantModel,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seen: bool,
}

impl Record for Chat {
    fn id(&self) -> &str {
        &self.chat_id
    }
}

impl Chat {
    /// True when the chat is between `a` and `b`, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    /// The participant id that is not `me`.
    pub fn peer_of(&self, me: &str) -> &str {
        if self.sender_id == me {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(alias = "_id", default)]
    pub message_id: Option<String>,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_model: ParticipantModel,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub chat_id: String,
    pub user_id: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserJoined {
    pub chat_id: String,
    pub user_id: String,
}
