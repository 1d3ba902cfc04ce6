use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::{decode_ack, SocketEventName, SocketTransport};
use crate::cache::EntityCache;
use crate::errors::Result;
use crate::models::{Chat, Participant};

#[derive(Debug, Clone)]
pub struct Discovery {
    pub chats: Vec<Chat>,
    /// The chat with the requested peer, when one exists or was just created.
    pub active: Option<Chat>,
}

/// Chat list for one signed-in participant, with find-or-create for a peer.
pub struct ChatDirectory {
    socket: Arc<dyn SocketTransport>,
    me: Participant,
    chats: Arc<EntityCache<Chat>>,
    attempted: Mutex<HashSet<String>>,
}

impl ChatDirectory {
    pub fn new(socket: Arc<dyn SocketTransport>, me: Participant) -> Self {
        Self {
            socket,
            me,
            chats: Arc::new(EntityCache::new()),
            attempted: Mutex::new(HashSet::new()),
        }
    }

    pub fn chats(&self) -> &Arc<EntityCache<Chat>> {
        &self.chats
    }

    fn creation_key(&self, peer: &Participant) -> String {
        format!("{}-{}", self.me.id, peer.id)
    }

    /// Returns true only for the first caller per peer until `teardown`.
    fn claim(&self, key: String) -> bool {
        self.attempted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key)
    }

    pub async fn list(&self) -> Result<Vec<Chat>> {
        let ack = self
            .socket
            .emit_with_ack(
                SocketEventName::GetChats,
                json!({ "userId": self.me.id, "userModel": self.me.model.as_str() }),
            )
            .await?;
        let mut chats: Vec<Chat> = decode_ack(SocketEventName::GetChats, ack)?;
        // Most recent conversation first; chats without messages go last.
        chats.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        self.chats.replace_all(chats.clone());
        Ok(chats)
    }

    /// Loads the chat list and, when `target` is given, finds the chat with
    /// that peer or asks the server to start one. The start request goes out
    /// at most once per peer no matter how often this runs.
    pub async fn discover(&self, target: Option<&Participant>) -> Result<Discovery> {
        let mut chats = self.list().await?;

        let Some(peer) = target else {
            return Ok(Discovery {
                chats,
                active: None,
            });
        };

        if let Some(existing) = chats.iter().find(|c| c.connects(&self.me.id, &peer.id)) {
            let active = Some(existing.clone());
            return Ok(Discovery { chats, active });
        }

        let key = self.creation_key(peer);
        if !self.claim(key.clone()) {
            tracing::debug!(key = %key, "chat creation already attempted, skipping");
            return Ok(Discovery {
                chats,
                active: None,
            });
        }

        let ack = self
            .socket
            .emit_with_ack(
                SocketEventName::StartChat,
                json!({
                    "senderId": self.me.id,
                    "senderModel": self.me.model.as_str(),
                    "receiverId": peer.id,
                    "receiverModel": peer.model.as_str(),
                }),
            )
            .await?;
        let created: Chat = decode_ack(SocketEventName::StartChat, ack).inspect_err(|e| {
            tracing::warn!(key = %key, error = %e, "failed to start chat");
        })?;

        tracing::info!(chat_id = %created.chat_id, peer = %peer.id, "chat started");
        self.chats.upsert(created.clone());
        chats.insert(0, created.clone());

        Ok(Discovery {
            chats,
            active: Some(created),
        })
    }

    /// Forgets creation attempts, e.g. on logout or when the chat screen
    /// unmounts.
    pub fn teardown(&self) {
        self.attempted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
