use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::{ApiClient, Mutation};
use crate::errors::Result;
use crate::models::{Notification, Page, PageRequest};

#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list_notifications(&self, page: PageRequest) -> Result<Page<Notification>>;
    async fn mark_read(&self, id: &str) -> Result<Mutation<Notification>>;
    async fn register_push_token(&self, token: &str) -> Result<()>;
}

#[async_trait]
impl NotificationApi for ApiClient {
    async fn list_notifications(&self, page: PageRequest) -> Result<Page<Notification>> {
        self.get_page("notifications", page).await
    }

    async fn mark_read(&self, id: &str) -> Result<Mutation<Notification>> {
        self.mutate(Method::PATCH, &format!("notifications/{id}/read"), &json!({}))
            .await
    }

    async fn register_push_token(&self, token: &str) -> Result<()> {
        self.mutate::<_, serde_json::Value>(
            Method::POST,
            "notifications/token",
            &json!({ "token": token }),
        )
        .await?;
        Ok(())
    }
}
