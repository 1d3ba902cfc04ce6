use serde::Serialize;
use validator::Validate;

use super::images::{stage_images, ImageRef};
use super::{required, StepForm};
use crate::errors::{self, ClientError};
use crate::models::Category;
use crate::services::upload::ImageHost;

#[derive(Debug, Clone, Default, Validate)]
pub struct CategoryForm {
    #[validate(
        custom(function = "required", message = "Category name is required"),
        length(max = 50, message = "Category name must not exceed 50 characters")
    )]
    pub name: String,

    #[validate(length(max = 300, message = "Description must not exceed 300 characters"))]
    pub description: Option<String>,

    pub image: Option<ImageRef>,
}

impl CategoryForm {
    pub fn for_edit(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            image: category.image.clone().map(ImageRef::Remote),
        }
    }

    pub async fn into_payload(self, host: &dyn ImageHost) -> errors::Result<CategoryPayload> {
        let image = match self.image {
            Some(image) => {
                let mut slot = [image];
                stage_images(&mut slot, host).await?;
                let [staged] = slot;
                match staged {
                    ImageRef::Remote(path) => Some(path),
                    ImageRef::Local(_) => {
                        return Err(ClientError::Upload(
                            "image has not been uploaded".to_string(),
                        ))
                    }
                }
            }
            None => None,
        };

        Ok(CategoryPayload {
            name: self.name.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            image,
        })
    }
}

impl StepForm for CategoryForm {
    const STEPS: &'static [&'static [&'static str]] = &[&["name", "description", "image"]];
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
