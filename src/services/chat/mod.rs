pub mod directory;
pub mod window;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::errors::{ClientError, Result};
use crate::models::{ApiEnvelope, ChatMessage, Notification, TypingEvent, UserJoined};

pub use directory::{ChatDirectory, Discovery};
pub use window::{ChatWindow, WindowUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketEventName {
    GetChats,
    StartChat,
    JoinRoom,
    GetMessages,
    SendMessage,
    Typing,
    ReceiveMessage,
    UserJoined,
    Notification,
}

impl SocketEventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocketEventName::GetChats => "get-chats",
            SocketEventName::StartChat => "start-chat",
            SocketEventName::JoinRoom => "join-room",
            SocketEventName::GetMessages => "get-messages",
            SocketEventName::SendMessage => "send-message",
            SocketEventName::Typing => "typing",
            SocketEventName::ReceiveMessage => "receive-message",
            SocketEventName::UserJoined => "user-joined",
            SocketEventName::Notification => "notification",
        }
    }
}

/// Server pushes the client listens for.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    ReceiveMessage(ChatMessage),
    Typing(TypingEvent),
    UserJoined(UserJoined),
    Notification(Notification),
}

impl SocketEvent {
    /// Decodes a raw broadcast frame. Unknown event names and malformed
    /// payloads yield `None`.
    pub fn decode(name: &str, payload: Value) -> Option<Self> {
        let event = match name {
            "receive-message" => SocketEvent::ReceiveMessage(serde_json::from_value(payload).ok()?),
            "typing" => SocketEvent::Typing(serde_json::from_value(payload).ok()?),
            "user-joined" => SocketEvent::UserJoined(serde_json::from_value(payload).ok()?),
            "notification" => SocketEvent::Notification(serde_json::from_value(payload).ok()?),
            _ => return None,
        };
        Some(event)
    }
}

/// Connection to the realtime server. Emits are acknowledgement-style; pushes
/// arrive on the broadcast channel.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn emit_with_ack(&self, event: SocketEventName, payload: Value) -> Result<Value>;
    fn subscribe(&self) -> broadcast::Receiver<SocketEvent>;
}

/// Unwraps an acknowledgement shaped like the REST envelope.
pub(crate) fn decode_ack<T: DeserializeOwned>(event: SocketEventName, ack: Value) -> Result<T> {
    let envelope: ApiEnvelope<T> = serde_json::from_value(ack)?;
    if !envelope.success {
        return Err(ClientError::Socket(envelope.message.unwrap_or_default()));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Socket(format!("{} ack carried no data", event.as_str())))
}

/// For emits whose acknowledgement carries no payload.
pub(crate) fn check_ack(ack: Value) -> Result<()> {
    let envelope: ApiEnvelope<Value> = serde_json::from_value(ack)?;
    if envelope.success {
        Ok(())
    } else {
        Err(ClientError::Socket(envelope.message.unwrap_or_default()))
    }
}
