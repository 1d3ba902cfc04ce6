use std::collections::HashMap;
use std::sync::Arc;

use crate::api::BookingApi;
use crate::cache::EntityCache;
use crate::errors::{ClientError, Result};
use crate::feedback::Toast;
use crate::models::{
    Booking, BookingAction, BookingStatus, ClientTab, PageRequest, RescheduleDecision, Role,
    VendorApproval, VendorTab,
};

/// Drives the booking lists of the vendor and client dashboards.
pub struct BookingController {
    api: Arc<dyn BookingApi>,
    cache: Arc<EntityCache<Booking>>,
    role: Role,
    page_size: u32,
}

impl BookingController {
    pub fn new(
        api: Arc<dyn BookingApi>,
        cache: Arc<EntityCache<Booking>>,
        role: Role,
        page_size: u32,
    ) -> Self {
        Self {
            api,
            cache,
            role,
            page_size,
        }
    }

    pub fn cache(&self) -> &Arc<EntityCache<Booking>> {
        &self.cache
    }

    /// Loads one page. Page 1 replaces the cached listing, later pages
    /// append to it. Returns whether more pages exist.
    pub async fn refresh(&self, page: u32) -> Result<bool> {
        let request = PageRequest {
            page: page.max(1),
            limit: self.page_size,
        };
        let result = self.api.list_bookings(self.role, request).await?;
        let has_more = result.has_more();

        if request.page == 1 {
            self.cache.replace_all(result.items);
        } else {
            for booking in result.items {
                self.cache.upsert(booking);
            }
        }

        tracing::debug!(role = self.role.as_str(), page, count = self.cache.len(), "bookings loaded");
        Ok(has_more)
    }

    // ── Views ──

    pub fn vendor_tab(&self, tab: VendorTab) -> Vec<Booking> {
        self.cache
            .values()
            .into_iter()
            .filter(|b| b.vendor_tab() == tab)
            .collect()
    }

    pub fn client_tab(&self, tab: ClientTab) -> Vec<Booking> {
        self.cache
            .values()
            .into_iter()
            .filter(|b| b.client_tab() == tab)
            .collect()
    }

    pub fn vendor_tab_counts(&self) -> HashMap<VendorTab, usize> {
        let mut counts: HashMap<VendorTab, usize> =
            VendorTab::ALL.iter().map(|t| (*t, 0)).collect();
        for b in self.cache.values() {
            *counts.entry(b.vendor_tab()).or_default() += 1;
        }
        counts
    }

    pub fn client_tab_counts(&self) -> HashMap<ClientTab, usize> {
        let mut counts: HashMap<ClientTab, usize> =
            ClientTab::ALL.iter().map(|t| (*t, 0)).collect();
        for b in self.cache.values() {
            *counts.entry(b.client_tab()).or_default() += 1;
        }
        counts
    }

    // ── Mutations ──

    pub async fn approve(&self, booking_id: &str) -> Result<Toast> {
        self.perform(booking_id, BookingAction::Approve).await
    }

    pub async fn reject(&self, booking_id: &str, reason: &str) -> Result<Toast> {
        self.perform(
            booking_id,
            BookingAction::Reject {
                reason: reason.to_string(),
            },
        )
        .await
    }

    pub async fn complete(&self, booking_id: &str) -> Result<Toast> {
        self.perform(booking_id, BookingAction::Complete).await
    }

    pub async fn cancel(&self, booking_id: &str, reason: &str) -> Result<Toast> {
        self.perform(
            booking_id,
            BookingAction::Cancel {
                reason: reason.to_string(),
            },
        )
        .await
    }

    fn authorize(&self, booking_id: &str, action: &BookingAction) -> Result<()> {
        let vendor_only = !matches!(action, BookingAction::Cancel { .. });
        if vendor_only && self.role != Role::Vendor {
            return Err(ClientError::InvalidTransition {
                id: booking_id.to_string(),
                action: action.name(),
                reason: "only the vendor can do this",
            });
        }
        Ok(())
    }

    /// Validates, patches the row optimistically, sends the request, then
    /// confirms or rolls back. Nothing is sent when validation fails.
    async fn perform(&self, booking_id: &str, action: BookingAction) -> Result<Toast> {
        if let Some(reason) = action.reason() {
            if reason.is_empty() {
                return Err(ClientError::Validation(format!(
                    "A reason is required to {} a booking",
                    action.name()
                )));
            }
        }

        self.authorize(booking_id, &action)?;

        let booking = self
            .cache
            .get(booking_id)
            .ok_or_else(|| ClientError::NotFound(booking_id.to_string()))?;

        booking
            .check(&action)
            .map_err(|reason| ClientError::InvalidTransition {
                id: booking_id.to_string(),
                action: action.name(),
                reason,
            })?;

        let token = self
            .cache
            .begin(booking_id, |b| b.apply(&action))
            .ok_or_else(|| ClientError::NotFound(booking_id.to_string()))?;

        let reason = action.reason();
        let result = match &action {
            BookingAction::Approve => {
                self.api
                    .set_vendor_approval(booking_id, VendorApproval::Approved, None)
                    .await
            }
            BookingAction::Reject { .. } => {
                self.api
                    .set_vendor_approval(booking_id, VendorApproval::Rejected, reason)
                    .await
            }
            BookingAction::Complete => {
                self.api
                    .set_booking_status(self.role, booking_id, BookingStatus::Completed, None)
                    .await
            }
            BookingAction::Cancel { .. } => {
                self.api
                    .set_booking_status(self.role, booking_id, BookingStatus::Cancelled, reason)
                    .await
            }
        };

        match result {
            Ok(reply) => {
                self.cache.confirm(&token, reply.data);
                tracing::info!(booking_id, action = action.name(), "booking updated");
                Ok(Toast::success(reply.message, default_success(&action)))
            }
            Err(e) => {
                tracing::warn!(booking_id, action = action.name(), error = %e, "booking update failed, rolling back");
                self.cache.revert(&token, e.user_message());
                Err(e)
            }
        }
    }

    /// Client answer to a vendor's reschedule request. The row only changes
    /// once the server has accepted the answer.
    pub async fn respond_reschedule(
        &self,
        booking_id: &str,
        decision: RescheduleDecision,
    ) -> Result<Toast> {
        if self.role != Role::Client {
            return Err(ClientError::InvalidTransition {
                id: booking_id.to_string(),
                action: "respond to reschedule of",
                reason: "only the client can do this",
            });
        }

        let booking = self
            .cache
            .get(booking_id)
            .ok_or_else(|| ClientError::NotFound(booking_id.to_string()))?;

        if !booking.has_open_reschedule() {
            return Err(ClientError::InvalidTransition {
                id: booking_id.to_string(),
                action: "respond to reschedule of",
                reason: "no reschedule request is open",
            });
        }

        let reply = self
            .api
            .respond_reschedule(booking_id, decision)
            .await
            .inspect_err(|e| {
                tracing::warn!(booking_id, error = %e, "reschedule response failed");
            })?;

        match reply.data {
            Some(updated) => self.cache.upsert(updated),
            None => {
                self.cache
                    .apply_confirmed(booking_id, |b| b.apply_reschedule(decision));
            }
        }

        let default = match decision {
            RescheduleDecision::Approved => "Reschedule accepted",
            RescheduleDecision::Rejected => "Reschedule declined",
        };
        Ok(Toast::success(reply.message, default))
    }
}

fn default_success(action: &BookingAction) -> &'static str {
    match action {
        BookingAction::Approve => "Booking approved",
        BookingAction::Reject { .. } => "Booking rejected",
        BookingAction::Complete => "Booking marked as completed",
        BookingAction::Cancel { .. } => "Booking cancelled",
    }
}
