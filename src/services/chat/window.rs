use std::sync::Arc;

use chrono::{FixedOffset, Local, NaiveDate, TimeZone};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::{check_ack, decode_ack, SocketEvent, SocketEventName, SocketTransport};
use crate::errors::{ClientError, Result};
use crate::models::{ChatMessage, Participant};

#[derive(Debug, Clone, PartialEq)]
pub enum WindowUpdate {
    MessageAdded(ChatMessage),
    PeerTyping(bool),
    PeerJoined(String),
}

/// One open conversation. Messages show up only when the server echoes
/// them back; nothing is inserted locally on send.
pub struct ChatWindow {
    socket: Arc<dyn SocketTransport>,
    chat_id: String,
    me: Participant,
    messages: Vec<ChatMessage>,
    peer_typing: bool,
    events: broadcast::Receiver<SocketEvent>,
}

impl ChatWindow {
    /// Joins the room, loads history, then starts listening.
    pub async fn open(
        socket: Arc<dyn SocketTransport>,
        chat_id: &str,
        me: Participant,
    ) -> Result<Self> {
        let ack = socket
            .emit_with_ack(
                SocketEventName::JoinRoom,
                json!({ "chatId": chat_id, "userId": me.id }),
            )
            .await?;
        check_ack(ack)?;

        let ack = socket
            .emit_with_ack(SocketEventName::GetMessages, json!({ "chatId": chat_id }))
            .await?;
        let messages: Vec<ChatMessage> = decode_ack(SocketEventName::GetMessages, ack)?;

        let events = socket.subscribe();
        tracing::debug!(chat_id, history = messages.len(), "chat window opened");

        Ok(Self {
            socket,
            chat_id: chat_id.to_string(),
            me,
            messages,
            peer_typing: false,
            events,
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn peer_typing(&self) -> bool {
        self.peer_typing
    }

    pub async fn send(&self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::Validation("Message cannot be empty".to_string()));
        }

        let ack = self
            .socket
            .emit_with_ack(
                SocketEventName::SendMessage,
                json!({
                    "chatId": self.chat_id,
                    "senderId": self.me.id,
                    "senderModel": self.me.model.as_str(),
                    "content": content,
                }),
            )
            .await?;
        check_ack(ack).inspect_err(|e| {
            tracing::warn!(chat_id = %self.chat_id, error = %e, "message rejected");
        })
    }

    /// Sent on every keystroke with `true` and on blur with `false`.
    pub async fn set_typing(&self, is_typing: bool) -> Result<()> {
        let ack = self
            .socket
            .emit_with_ack(
                SocketEventName::Typing,
                json!({
                    "chatId": self.chat_id,
                    "userId": self.me.id,
                    "isTyping": is_typing,
                }),
            )
            .await?;
        check_ack(ack)
    }

    /// Applies one pushed event. Events for other chats and our own typing
    /// echoes are ignored.
    pub fn handle(&mut self, event: SocketEvent) -> Option<WindowUpdate> {
        match event {
            SocketEvent::ReceiveMessage(message) if message.chat_id == self.chat_id => {
                self.messages.push(message.clone());
                if message.sender_id != self.me.id {
                    self.peer_typing = false;
                }
                Some(WindowUpdate::MessageAdded(message))
            }
            SocketEvent::Typing(typing)
                if typing.chat_id == self.chat_id && typing.user_id != self.me.id =>
            {
                self.peer_typing = typing.is_typing;
                Some(WindowUpdate::PeerTyping(typing.is_typing))
            }
            SocketEvent::UserJoined(joined)
                if joined.chat_id == self.chat_id && joined.user_id != self.me.id =>
            {
                Some(WindowUpdate::PeerJoined(joined.user_id))
            }
            _ => None,
        }
    }

    /// Waits for the next event that changes this window. Returns `None` once
    /// the transport is gone.
    pub async fn next_update(&mut self) -> Option<WindowUpdate> {
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    if let Some(update) = self.handle(event) {
                        return Some(update);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(chat_id = %self.chat_id, skipped, "chat window lagged behind socket");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Messages grouped by calendar day in `tz`, in arrival order.
    pub fn grouped_by_date<Tz: TimeZone>(&self, tz: &Tz) -> Vec<(NaiveDate, Vec<ChatMessage>)> {
        let mut groups: Vec<(NaiveDate, Vec<ChatMessage>)> = Vec::new();
        for message in &self.messages {
            let day = message.created_at.with_timezone(tz).date_naive();
            match groups.last_mut() {
                Some((d, items)) if *d == day => items.push(message.clone()),
                _ => groups.push((day, vec![message.clone()])),
            }
        }
        groups
    }

    pub fn grouped_by_local_date(&self) -> Vec<(NaiveDate, Vec<ChatMessage>)> {
        self.grouped_by_date(&Local)
    }

    pub fn grouped_by_offset(&self, offset: FixedOffset) -> Vec<(NaiveDate, Vec<ChatMessage>)> {
        self.grouped_by_date(&offset)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde_json::json;

    use super::*;
    use crate::models::{ParticipantModel, TypingEvent};
    use crate::services::chat::testing::MockSocket;

    fn me() -> Participant {
        Participant::new("u1", ParticipantModel::Client)
    }

    fn message(chat: &str, sender: &str, content: &str, at: &str) -> ChatMessage {
        ChatMessage {
            message_id: None,
            chat_id: chat.to_string(),
            sender_id: sender.to_string(),
            sender_model: ParticipantModel::Vendor,
            content: content.to_string(),
            created_at: at.parse::<DateTime<Utc>>().unwrap(),
        }
    }

    async fn open_window(socket: Arc<MockSocket>) -> ChatWindow {
        socket.ack(
            SocketEventName::GetMessages,
            json!({"success": true, "data": [
                {"chatId": "c1", "senderId": "v1", "senderModel": "vendor", "content": "hi", "createdAt": "2025-06-16T09:00:00Z"}
            ]}),
        );
        ChatWindow::open(socket, "c1", me()).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_joins_then_fetches() {
        let socket = Arc::new(MockSocket::new());
        let window = open_window(socket.clone()).await;

        let order: Vec<SocketEventName> = socket
            .emitted
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| *e)
            .collect();
        assert_eq!(order, vec![SocketEventName::JoinRoom, SocketEventName::GetMessages]);
        assert_eq!(window.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_send_does_not_insert_locally() {
        let socket = Arc::new(MockSocket::new());
        let mut window = open_window(socket.clone()).await;

        window.send("  see you at 5 ").await.unwrap();
        assert_eq!(window.messages().len(), 1);
        let (_, payload) = socket.emitted.lock().unwrap().last().cloned().unwrap();
        assert_eq!(payload["content"], "see you at 5");
        assert_eq!(payload["senderModel"], "client");

        // The echo is what makes it appear.
        socket
            .tx
            .send(SocketEvent::ReceiveMessage(message(
                "c1",
                "u1",
                "see you at 5",
                "2025-06-16T09:05:00Z",
            )))
            .unwrap();
        let update = window.next_update().await.unwrap();
        assert!(matches!(update, WindowUpdate::MessageAdded(_)));
        assert_eq!(window.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_send_failure_surfaces_server_message() {
        let socket = Arc::new(MockSocket::new());
        let window = open_window(socket.clone()).await;
        socket.ack(
            SocketEventName::SendMessage,
            json!({"success": false, "message": "You are blocked"}),
        );
        let err = window.send("hello").await.unwrap_err();
        assert_eq!(err.user_message(), "You are blocked");

        assert!(window.send("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_typing_echo_suppressed() {
        let socket = Arc::new(MockSocket::new());
        let mut window = open_window(socket).await;

        let own = SocketEvent::Typing(TypingEvent {
            chat_id: "c1".to_string(),
            user_id: "u1".to_string(),
            is_typing: true,
        });
        assert_eq!(window.handle(own), None);
        assert!(!window.peer_typing());

        let peer = SocketEvent::Typing(TypingEvent {
            chat_id: "c1".to_string(),
            user_id: "v1".to_string(),
            is_typing: true,
        });
        assert_eq!(window.handle(peer), Some(WindowUpdate::PeerTyping(true)));
        assert!(window.peer_typing());
    }

    #[tokio::test]
    async fn test_duplicates_and_other_chats() {
        let socket = Arc::new(MockSocket::new());
        let mut window = open_window(socket).await;

        let m = message("c1", "v1", "again", "2025-06-16T09:10:00Z");
        window.handle(SocketEvent::ReceiveMessage(m.clone()));
        window.handle(SocketEvent::ReceiveMessage(m));
        assert!(window
            .handle(SocketEvent::ReceiveMessage(message(
                "c2",
                "v1",
                "elsewhere",
                "2025-06-16T09:11:00Z"
            )))
            .is_none());
        // No de-duplication is applied.
        assert_eq!(window.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_grouping_by_date_uses_offset() {
        let socket = Arc::new(MockSocket::new());
        let mut window = open_window(socket).await;
        window.handle(SocketEvent::ReceiveMessage(message(
            "c1",
            "v1",
            "late",
            "2025-06-16T23:30:00Z",
        )));

        let utc = window.grouped_by_offset(FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.len(), 1);
        assert_eq!(utc[0].1.len(), 2);

        // Two hours ahead, the late message falls on the next day.
        let ahead = window.grouped_by_offset(FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(ahead.len(), 2);
        assert_eq!(ahead[1].0, NaiveDate::from_ymd_opt(2025, 6, 17).unwrap());
    }
}
