use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::{ApiClient, Mutation};
use crate::errors::Result;
use crate::models::{Page, PageRequest, Ticket};

#[async_trait]
pub trait TicketApi: Send + Sync {
    async fn list_tickets(&self, page: PageRequest) -> Result<Page<Ticket>>;

    async fn cancel_ticket(&self, ticket_id: &str, reason: Option<&str>)
        -> Result<Mutation<Ticket>>;
}

#[async_trait]
impl TicketApi for ApiClient {
    async fn list_tickets(&self, page: PageRequest) -> Result<Page<Ticket>> {
        self.get_page("client/tickets", page).await
    }

    async fn cancel_ticket(
        &self,
        ticket_id: &str,
        reason: Option<&str>,
    ) -> Result<Mutation<Ticket>> {
        let body = match reason {
            Some(reason) => json!({ "reason": reason }),
            None => json!({}),
        };
        self.mutate(
            Method::PATCH,
            &format!("client/tickets/{ticket_id}/cancel"),
            &body,
        )
        .await
    }
}
