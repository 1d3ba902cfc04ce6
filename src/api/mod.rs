//! REST plumbing. One thin trait per concern so controllers can be driven
//! by mocks; [`ApiClient`] implements all of them over `reqwest`.

pub mod bookings;
pub mod catalog;
pub mod notifications;
pub mod tickets;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{ClientError, Result};
use crate::models::{ApiEnvelope, PageRequest, Session};

pub use bookings::BookingApi;
pub use catalog::CatalogApi;
pub use notifications::NotificationApi;
pub use tickets::TicketApi;

/// Server reply to a mutation: a message for the toast and, sometimes, the
/// updated record.
pub type Mutation<T> = ApiEnvelope<T>;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Option<&Session>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: session.map(|s| s.token.clone()),
            client: reqwest::Client::new(),
        }
    }

    /// Same connection pool, different credentials.
    pub fn with_session(&self, session: Option<&Session>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            token: session.map(|s| s.token.clone()),
            client: self.client.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<ApiEnvelope<T>> {
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let envelope: ApiEnvelope<T> = if body.is_empty() {
            ApiEnvelope {
                success: true,
                message: None,
                data: None,
            }
        } else {
            serde_json::from_slice(&body)?
        };

        if !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.message,
            });
        }

        Ok(envelope)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let envelope = self
            .send(self.request(Method::GET, path).query(query))
            .await?;
        envelope
            .data
            .ok_or_else(|| ClientError::NotFound(format!("empty response from {path}")))
    }

    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: PageRequest,
    ) -> Result<T> {
        self.get(
            path,
            &[
                ("page", page.page.to_string()),
                ("limit", page.limit.to_string()),
            ],
        )
        .await
    }

    pub(crate) async fn mutate<B, T>(&self, method: Method, path: &str, body: &B) -> Result<Mutation<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, path).json(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Mutation<serde_json::Value>> {
        self.send(self.request(Method::DELETE, path)).await
    }
}

/// Pulls `message` (or `error`) out of an error body, if it is JSON at all.
fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}
