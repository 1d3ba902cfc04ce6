use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::{ApiClient, Mutation};
use crate::errors::Result;
use crate::forms::{CategoryPayload, EventPayload, ServicePayload};
use crate::models::{
    ActiveStatus, ApplicationStatus, Category, Event, Page, PageRequest, Service,
    VendorApplication,
};

/// Admin and vendor CRUD over categories, services, events and vendor
/// applications.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_categories(&self, page: PageRequest) -> Result<Page<Category>>;
    async fn create_category(&self, payload: &CategoryPayload) -> Result<Mutation<Category>>;
    async fn update_category(&self, id: &str, payload: &CategoryPayload)
        -> Result<Mutation<Category>>;
    async fn set_category_status(&self, id: &str, status: ActiveStatus)
        -> Result<Mutation<Category>>;
    async fn delete_category(&self, id: &str) -> Result<()>;

    async fn list_services(&self, page: PageRequest) -> Result<Page<Service>>;
    async fn create_service(&self, payload: &ServicePayload) -> Result<Mutation<Service>>;
    async fn update_service(&self, id: &str, payload: &ServicePayload) -> Result<Mutation<Service>>;
    async fn delete_service(&self, id: &str) -> Result<()>;

    async fn list_events(&self, page: PageRequest) -> Result<Page<Event>>;
    async fn create_event(&self, payload: &EventPayload) -> Result<Mutation<Event>>;
    async fn update_event(&self, id: &str, payload: &EventPayload) -> Result<Mutation<Event>>;
    async fn delete_event(&self, id: &str) -> Result<()>;

    async fn list_vendor_applications(&self, page: PageRequest)
        -> Result<Page<VendorApplication>>;
    async fn set_vendor_status(
        &self,
        vendor_id: &str,
        status: ApplicationStatus,
        reason: Option<&str>,
    ) -> Result<Mutation<VendorApplication>>;
}

#[async_trait]
impl CatalogApi for ApiClient {
    // ── Categories ──

    async fn list_categories(&self, page: PageRequest) -> Result<Page<Category>> {
        self.get_page("admin/categories", page).await
    }

    async fn create_category(&self, payload: &CategoryPayload) -> Result<Mutation<Category>> {
        self.mutate(Method::POST, "admin/categories", payload).await
    }

    async fn update_category(
        &self,
        id: &str,
        payload: &CategoryPayload,
    ) -> Result<Mutation<Category>> {
        self.mutate(Method::PUT, &format!("admin/categories/{id}"), payload)
            .await
    }

    async fn set_category_status(
        &self,
        id: &str,
        status: ActiveStatus,
    ) -> Result<Mutation<Category>> {
        self.mutate(
            Method::PATCH,
            &format!("admin/categories/{id}/status"),
            &json!({ "status": status }),
        )
        .await
    }

    async fn delete_category(&self, id: &str) -> Result<()> {
        self.delete(&format!("admin/categories/{id}")).await?;
        Ok(())
    }

    // ── Services ──

    async fn list_services(&self, page: PageRequest) -> Result<Page<Service>> {
        self.get_page("vendor/services", page).await
    }

    async fn create_service(&self, payload: &ServicePayload) -> Result<Mutation<Service>> {
        self.mutate(Method::POST, "vendor/services", payload).await
    }

    async fn update_service(&self, id: &str, payload: &ServicePayload) -> Result<Mutation<Service>> {
        self.mutate(Method::PUT, &format!("vendor/services/{id}"), payload)
            .await
    }

    async fn delete_service(&self, id: &str) -> Result<()> {
        self.delete(&format!("vendor/services/{id}")).await?;
        Ok(())
    }

    // ── Events ──

    async fn list_events(&self, page: PageRequest) -> Result<Page<Event>> {
        self.get_page("vendor/events", page).await
    }

    async fn create_event(&self, payload: &EventPayload) -> Result<Mutation<Event>> {
        self.mutate(Method::POST, "vendor/events", payload).await
    }

    async fn update_event(&self, id: &str, payload: &EventPayload) -> Result<Mutation<Event>> {
        self.mutate(Method::PUT, &format!("vendor/events/{id}"), payload)
            .await
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        self.delete(&format!("vendor/events/{id}")).await?;
        Ok(())
    }

    // ── Vendor applications ──

    async fn list_vendor_applications(
        &self,
        page: PageRequest,
    ) -> Result<Page<VendorApplication>> {
        self.get_page("admin/vendors/applications", page).await
    }

    async fn set_vendor_status(
        &self,
        vendor_id: &str,
        status: ApplicationStatus,
        reason: Option<&str>,
    ) -> Result<Mutation<VendorApplication>> {
        self.mutate(
            Method::PATCH,
            &format!("admin/vendors/{vendor_id}/status"),
            &json!({ "status": status.as_str(), "reason": reason }),
        )
        .await
    }
}
