use serde::{Deserialize, Serialize};

use super::chat::{Participant, ParticipantModel};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Vendor => "vendor",
            Role::Client => "client",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "vendor" => Some(Role::Vendor),
            "client" | "user" => Some(Role::Client),
            _ => None,
        }
    }

    /// Chat participants are clients or vendors; admins do not chat.
    pub fn participant_model(&self) -> Option<ParticipantModel> {
        match self {
            Role::Client => Some(ParticipantModel::Client),
            Role::Vendor => Some(ParticipantModel::Vendor),
            Role::Admin => None,
        }
    }
}

/// Authenticated session. Passed explicitly to whatever needs it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub token: String,
}

impl Session {
    pub fn participant(&self) -> Option<Participant> {
        self.role
            .participant_model()
            .map(|model| Participant::new(self.user_id.clone(), model))
    }
}
