use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::api::NotificationApi;
use crate::cache::EntityCache;
use crate::db::{self, queries, Db};
use crate::errors::{ClientError, Result};
use crate::models::{Notification, PageRequest};
use crate::services::chat::SocketEvent;

// ── Feed ──

pub struct NotificationFeed {
    api: Arc<dyn NotificationApi>,
    cache: Arc<EntityCache<Notification>>,
    page_size: u32,
}

impl NotificationFeed {
    pub fn new(api: Arc<dyn NotificationApi>, page_size: u32) -> Self {
        Self {
            api,
            cache: Arc::new(EntityCache::new()),
            page_size,
        }
    }

    pub fn cache(&self) -> &Arc<EntityCache<Notification>> {
        &self.cache
    }

    pub async fn refresh(&self, page: u32) -> Result<bool> {
        let request = PageRequest {
            page: page.max(1),
            limit: self.page_size,
        };
        let result = self.api.list_notifications(request).await?;
        let has_more = result.has_more();
        if request.page == 1 {
            self.cache.replace_all(result.items);
        } else {
            for n in result.items {
                self.cache.upsert(n);
            }
        }
        Ok(has_more)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Notification> {
        let mut items = self.cache.values();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    pub fn unread_count(&self) -> usize {
        self.cache.values().iter().filter(|n| !n.read).count()
    }

    /// Marks one notification read right away and rolls back if the server
    /// refuses.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        match self.cache.get(id) {
            Some(n) if n.read => return Ok(()),
            Some(_) => {}
            None => return Err(ClientError::NotFound(id.to_string())),
        }

        let token = self
            .cache
            .begin(id, |n| n.read = true)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;

        match self.api.mark_read(id).await {
            Ok(reply) => {
                self.cache.confirm(&token, reply.data);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(notification_id = id, error = %e, "mark read failed");
                self.cache.revert(&token, e.user_message());
                Err(e)
            }
        }
    }

    /// Adds a pushed notification. Returns whether the event was one.
    pub fn ingest(&self, event: &SocketEvent) -> bool {
        match event {
            SocketEvent::Notification(n) => {
                tracing::debug!(notification_id = %n.id, "notification received");
                self.cache.upsert(n.clone());
                true
            }
            _ => false,
        }
    }

    /// Feeds socket pushes into the cache until the socket goes away.
    pub async fn listen(&self, mut events: broadcast::Receiver<SocketEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.ingest(&event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification listener lagged, refetching");
                    if let Err(e) = self.refresh(1).await {
                        tracing::error!(error = %e, "failed to refetch notifications");
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

// ── Push token ──

/// Keeps the server's copy of this device's push token current.
pub struct PushTokenRegistrar {
    api: Arc<dyn NotificationApi>,
    db: Db,
}

impl PushTokenRegistrar {
    pub fn new(api: Arc<dyn NotificationApi>, db: Db) -> Self {
        Self { api, db }
    }

    pub fn cached(&self) -> Result<Option<String>> {
        queries::get_value(&db::lock(&self.db), queries::PUSH_TOKEN_KEY)
    }

    /// Submits `token` only when it differs from the last one the server
    /// accepted. Returns whether a request was sent.
    pub async fn sync(&self, token: &str) -> Result<bool> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(false);
        }
        if self.cached()?.as_deref() == Some(token) {
            tracing::debug!("push token unchanged, skipping registration");
            return Ok(false);
        }

        if let Err(e) = self.api.register_push_token(token).await {
            tracing::error!(error = %e, "push token registration failed");
            return Err(e);
        }

        queries::set_value(&db::lock(&self.db), queries::PUSH_TOKEN_KEY, token)?;
        tracing::info!("push token registered");
        Ok(true)
    }

    pub fn forget(&self) -> Result<()> {
        queries::delete_value(&db::lock(&self.db), queries::PUSH_TOKEN_KEY)?;
        Ok(())
    }
}
