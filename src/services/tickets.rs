use std::collections::HashMap;
use std::sync::Arc;

use crate::api::TicketApi;
use crate::cache::EntityCache;
use crate::errors::{ClientError, Result};
use crate::feedback::Toast;
use crate::models::{PageRequest, Ticket, TicketStatus, TicketTab};
use crate::services::ticket_pass::{QrFetcher, TicketPass};

pub struct TicketController {
    api: Arc<dyn TicketApi>,
    cache: Arc<EntityCache<Ticket>>,
    qr: Arc<dyn QrFetcher>,
    page_size: u32,
}

impl TicketController {
    pub fn new(
        api: Arc<dyn TicketApi>,
        cache: Arc<EntityCache<Ticket>>,
        qr: Arc<dyn QrFetcher>,
        page_size: u32,
    ) -> Self {
        Self {
            api,
            cache,
            qr,
            page_size,
        }
    }

    pub fn cache(&self) -> &Arc<EntityCache<Ticket>> {
        &self.cache
    }

    pub async fn refresh(&self, page: u32) -> Result<bool> {
        let request = PageRequest {
            page: page.max(1),
            limit: self.page_size,
        };
        let result = self.api.list_tickets(request).await?;
        let has_more = result.has_more();

        if request.page == 1 {
            self.cache.replace_all(result.items);
        } else {
            for ticket in result.items {
                self.cache.upsert(ticket);
            }
        }
        Ok(has_more)
    }

    pub fn tab(&self, tab: TicketTab) -> Vec<Ticket> {
        self.cache
            .values()
            .into_iter()
            .filter(|t| t.tab() == tab)
            .collect()
    }

    pub fn tab_counts(&self) -> HashMap<TicketTab, usize> {
        let mut counts: HashMap<TicketTab, usize> =
            TicketTab::ALL.iter().map(|t| (*t, 0)).collect();
        for t in self.cache.values() {
            *counts.entry(t.tab()).or_default() += 1;
        }
        counts
    }

    /// Cancels a ticket. The row is patched once the server accepts; a
    /// returned ticket (e.g. with its refund amount) replaces the row.
    pub async fn cancel(&self, ticket_id: &str, reason: Option<&str>) -> Result<Toast> {
        let ticket = self
            .cache
            .get(ticket_id)
            .ok_or_else(|| ClientError::NotFound(ticket_id.to_string()))?;

        if !ticket.is_cancellable() {
            return Err(ClientError::InvalidTransition {
                id: ticket_id.to_string(),
                action: "cancel",
                reason: "ticket has already been used or cancelled",
            });
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let reply = self
            .api
            .cancel_ticket(ticket_id, reason)
            .await
            .inspect_err(|e| tracing::warn!(ticket_id, error = %e, "ticket cancellation failed"))?;

        match reply.data {
            Some(updated) if updated.ticket_status == TicketStatus::Cancelled => {
                self.cache.upsert(updated)
            }
            _ => {
                self.cache
                    .apply_confirmed(ticket_id, |t| t.ticket_status = TicketStatus::Cancelled);
            }
        }

        tracing::info!(ticket_id, "ticket cancelled");
        Ok(Toast::success(reply.message, "Ticket cancelled"))
    }

    /// Renders a downloadable pass for a cached ticket. Never fails because
    /// of the QR image; a placeholder is drawn instead.
    pub async fn download(&self, ticket_id: &str) -> Result<TicketPass> {
        let ticket = self
            .cache
            .get(ticket_id)
            .ok_or_else(|| ClientError::NotFound(ticket_id.to_string()))?;

        let qr = match ticket.qr_code_link.as_deref() {
            Some(url) => match self.qr.fetch(url).await {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!(ticket_id, error = %e, "QR image unavailable, using placeholder");
                    None
                }
            },
            None => None,
        };

        Ok(TicketPass::render(&ticket, qr.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::api::Mutation;
    use crate::models::ticket::sample_ticket;
    use crate::models::Page;
    use crate::services::ticket_pass::QrImage;

    #[derive(Default)]
    struct MockTicketApi {
        calls: Mutex<Vec<(String, Option<String>)>>,
        listing: Vec<Ticket>,
        fail: bool,
    }

    #[async_trait]
    impl TicketApi for MockTicketApi {
        async fn list_tickets(&self, _page: PageRequest) -> Result<Page<Ticket>> {
            Ok(Page {
                items: self.listing.clone(),
                page: 1,
                total_pages: 1,
                total: self.listing.len() as u64,
            })
        }

        async fn cancel_ticket(
            &self,
            ticket_id: &str,
            reason: Option<&str>,
        ) -> Result<Mutation<Ticket>> {
            self.calls
                .lock()
                .unwrap()
                .push((ticket_id.to_string(), reason.map(String::from)));
            if self.fail {
                return Err(ClientError::Api {
                    status: 400,
                    message: Some("Event already started".to_string()),
                });
            }
            Ok(Mutation {
                success: true,
                message: None,
                data: None,
            })
        }
    }

    struct BrokenQr;

    #[async_trait]
    impl QrFetcher for BrokenQr {
        async fn fetch(&self, _url: &str) -> Result<QrImage> {
            Err(ClientError::NotFound("qr".to_string()))
        }
    }

    fn listing() -> Vec<Ticket> {
        vec![
            sample_ticket("TKT-1", TicketStatus::Unused),
            sample_ticket("TKT-9", TicketStatus::Active),
            sample_ticket("TKT-3", TicketStatus::PartiallyRefunded),
            sample_ticket("TKT-4", TicketStatus::Used),
            sample_ticket("TKT-5", TicketStatus::Cancelled),
        ]
    }

    async fn controller(fail: bool) -> (TicketController, Arc<MockTicketApi>) {
        let api = Arc::new(MockTicketApi {
            listing: listing(),
            fail,
            ..Default::default()
        });
        let c = TicketController::new(
            api.clone(),
            Arc::new(EntityCache::new()),
            Arc::new(BrokenQr),
            10,
        );
        c.refresh(1).await.unwrap();
        (c, api)
    }

    #[tokio::test]
    async fn test_tab_partition() {
        let (c, _) = controller(false).await;
        let counts = c.tab_counts();
        assert_eq!(counts[&TicketTab::Unused], 3);
        assert_eq!(counts[&TicketTab::Used], 1);
        assert_eq!(counts[&TicketTab::Cancelled], 1);
    }

    #[tokio::test]
    async fn test_cancel_active_ticket_moves_tabs() {
        let (c, api) = controller(false).await;
        let toast = c.cancel("TKT-9", None).await.unwrap();
        assert_eq!(toast.message, "Ticket cancelled");

        assert_eq!(
            c.cache().get("TKT-9").unwrap().ticket_status,
            TicketStatus::Cancelled
        );
        let counts = c.tab_counts();
        assert_eq!(counts[&TicketTab::Unused], 2);
        assert_eq!(counts[&TicketTab::Cancelled], 2);
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_sends_reason_when_given() {
        let (c, api) = controller(false).await;
        c.cancel("TKT-1", Some("  can't attend ")).await.unwrap();
        c.cancel("TKT-3", Some("   ")).await.unwrap();
        let calls = api.calls.lock().unwrap().clone();
        assert_eq!(calls[0].1.as_deref(), Some("can't attend"));
        assert_eq!(calls[1].1, None);
    }

    #[tokio::test]
    async fn test_cannot_cancel_used_ticket() {
        let (c, api) = controller(false).await;
        assert!(c.cancel("TKT-4", None).await.is_err());
        assert!(c.cancel("TKT-5", None).await.is_err());
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_cancel_keeps_status() {
        let (c, _) = controller(true).await;
        let err = c.cancel("TKT-9", None).await.unwrap_err();
        assert_eq!(err.user_message(), "Event already started");
        assert_eq!(
            c.cache().get("TKT-9").unwrap().ticket_status,
            TicketStatus::Active
        );
    }

    #[tokio::test]
    async fn test_download_with_broken_qr_uses_placeholder() {
        let (c, _) = controller(false).await;
        let pass = c.download("TKT-1").await.unwrap();
        assert!(pass.svg.contains("QR unavailable"));
        assert_eq!(pass.file_name, "ticket-TKT-1.svg");
    }
}
