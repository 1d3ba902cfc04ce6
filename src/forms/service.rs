use serde::Serialize;
use validator::Validate;

use super::images::{non_empty_images, remote_paths, stage_images, ImageRef};
use super::{locked_error, required, EditLocks, StepForm};
use crate::errors::{self, FieldError};
use crate::models::Service;
use crate::services::upload::ImageHost;

#[derive(Debug, Clone, Default, Validate)]
pub struct ServiceForm {
    #[validate(
        custom(function = "required", message = "Service name is required"),
        length(max = 100, message = "Service name must not exceed 100 characters")
    )]
    pub name: String,

    #[validate(custom(function = "required", message = "Please select a category"))]
    pub category_id: String,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than zero"))]
    pub price: f64,

    #[validate(custom(function = "non_empty_images", message = "Add at least one image"))]
    pub images: Vec<ImageRef>,

    pub locks: EditLocks,
    original_price: Option<f64>,
}

impl ServiceForm {
    /// Prefills from an existing service. The price locks once it has been
    /// booked.
    pub fn for_edit(service: &Service, booked: u32) -> Self {
        Self {
            name: service.name.clone(),
            category_id: service.category_id.clone(),
            description: service.description.clone().unwrap_or_default(),
            price: service.price,
            images: service
                .images
                .iter()
                .map(|p| ImageRef::Remote(p.clone()))
                .collect(),
            locks: EditLocks::for_sold(booked),
            original_price: Some(service.price),
        }
    }

    pub async fn into_payload(mut self, host: &dyn ImageHost) -> errors::Result<ServicePayload> {
        stage_images(&mut self.images, host).await?;
        Ok(ServicePayload {
            images: remote_paths(&self.images)?,
            name: self.name.trim().to_string(),
            category_id: self.category_id,
            description: self.description.trim().to_string(),
            price: self.price,
        })
    }
}

impl StepForm for ServiceForm {
    const STEPS: &'static [&'static [&'static str]] = &[
        &["name", "category_id", "description"],
        &["price", "images"],
    ];

    fn cross_checks(&self) -> Vec<FieldError> {
        match self.original_price {
            Some(original) if self.locks.price_locked && self.price != original => {
                vec![locked_error("price")]
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    pub name: String,
    pub category_id: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
}
