use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::{ApiClient, Mutation};
use crate::errors::Result;
use crate::models::{
    Booking, BookingStatus, Page, PageRequest, RescheduleDecision, Role, VendorApproval,
};

#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn list_bookings(&self, role: Role, page: PageRequest) -> Result<Page<Booking>>;

    async fn set_vendor_approval(
        &self,
        booking_id: &str,
        approval: VendorApproval,
        reason: Option<&str>,
    ) -> Result<Mutation<Booking>>;

    async fn set_booking_status(
        &self,
        role: Role,
        booking_id: &str,
        status: BookingStatus,
        reason: Option<&str>,
    ) -> Result<Mutation<Booking>>;

    async fn respond_reschedule(
        &self,
        booking_id: &str,
        decision: RescheduleDecision,
    ) -> Result<Mutation<Booking>>;
}

#[async_trait]
impl BookingApi for ApiClient {
    async fn list_bookings(&self, role: Role, page: PageRequest) -> Result<Page<Booking>> {
        self.get_page(&format!("{}/bookings", role.as_str()), page)
            .await
    }

    async fn set_vendor_approval(
        &self,
        booking_id: &str,
        approval: VendorApproval,
        reason: Option<&str>,
    ) -> Result<Mutation<Booking>> {
        let body = json!({
            "vendorApproval": approval.as_str(),
            "reason": reason,
        });
        self.mutate(
            Method::PATCH,
            &format!("vendor/bookings/{booking_id}/approval"),
            &body,
        )
        .await
    }

    async fn set_booking_status(
        &self,
        role: Role,
        booking_id: &str,
        status: BookingStatus,
        reason: Option<&str>,
    ) -> Result<Mutation<Booking>> {
        let body = json!({
            "status": status.as_str(),
            "reason": reason,
        });
        self.mutate(
            Method::PATCH,
            &format!("{}/bookings/{booking_id}/status", role.as_str()),
            &body,
        )
        .await
    }

    async fn respond_reschedule(
        &self,
        booking_id: &str,
        decision: RescheduleDecision,
    ) -> Result<Mutation<Booking>> {
        let body = json!({ "status": decision.as_str() });
        self.mutate(
            Method::PATCH,
            &format!("client/bookings/{booking_id}/reschedule"),
            &body,
        )
        .await
    }
}
