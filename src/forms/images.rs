use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use validator::ValidationError;

use crate::errors::{ClientError, Result};
use crate::services::upload::ImageHost;

/// An image picked on the device that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LocalImage {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl LocalImage {
    pub fn from_bytes(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ClientError::Validation("Not a data URL".to_string()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| ClientError::Validation("Malformed data URL".to_string()))?;
        let mime = meta
            .strip_suffix(";base64")
            .ok_or_else(|| ClientError::Validation("Only base64 data URLs are supported".to_string()))?;
        if !mime.starts_with("image/") {
            return Err(ClientError::Validation(format!("{mime} is not an image")));
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ClientError::Validation(format!("Invalid image data: {e}")))?;
        let extension = mime.trim_start_matches("image/").split('+').next().unwrap_or("img");

        Ok(Self {
            file_name: format!("upload.{extension}"),
            mime: mime.to_string(),
            bytes,
        })
    }
}

/// A form image slot: either already hosted or waiting for upload.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum ImageRef {
    Remote(String),
    Local(LocalImage),
}

impl ImageRef {
    pub fn parse(value: &str) -> Result<Self> {
        if value.starts_with("data:") {
            LocalImage::from_data_url(value).map(ImageRef::Local)
        } else {
            Ok(ImageRef::Remote(value.to_string()))
        }
    }

    pub fn remote(&self) -> Option<&str> {
        match self {
            ImageRef::Remote(path) => Some(path),
            ImageRef::Local(_) => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ImageRef::Local(_))
    }
}

/// Form rule for image lists that need at least one slot.
pub(crate) fn non_empty_images(images: &[ImageRef]) -> std::result::Result<(), ValidationError> {
    if images.is_empty() {
        Err(ValidationError::new("images"))
    } else {
        Ok(())
    }
}

/// Uploads every local image and swaps the slot for the hosted path.
/// Slots keep their position; remote entries are left alone. On failure the
/// slots uploaded so far stay remote so a retry only sends the rest.
pub async fn stage_images(images: &mut [ImageRef], host: &dyn ImageHost) -> Result<usize> {
    let mut uploaded = 0;
    for slot in images.iter_mut() {
        let ImageRef::Local(local) = slot else {
            continue;
        };
        let path = host.upload(local).await.inspect_err(|e| {
            tracing::warn!(file = %local.file_name, error = %e, "image upload failed");
        })?;
        *slot = ImageRef::Remote(path);
        uploaded += 1;
    }
    if uploaded > 0 {
        tracing::debug!(uploaded, total = images.len(), "images staged");
    }
    Ok(uploaded)
}

/// Every slot as a hosted path. Fails if anything is still local.
pub(crate) fn remote_paths(images: &[ImageRef]) -> Result<Vec<String>> {
    images
        .iter()
        .map(|img| {
            img.remote()
                .map(String::from)
                .ok_or_else(|| ClientError::Upload("image has not been uploaded".to_string()))
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::MockHost;
    use super::*;

    const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_parse_data_url() {
        match ImageRef::parse(PNG_DATA_URL).unwrap() {
            ImageRef::Local(img) => {
                assert_eq!(img.mime, "image/png");
                assert_eq!(img.file_name, "upload.png");
                assert_eq!(&img.bytes[1..4], b"PNG");
            }
            other => panic!("expected local image, got {other:?}"),
        }
        assert_eq!(
            ImageRef::parse("events/poster.jpg").unwrap(),
            ImageRef::Remote("events/poster.jpg".to_string())
        );
    }

    #[test]
    fn test_rejects_bad_data_urls() {
        assert!(LocalImage::from_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(LocalImage::from_data_url("data:image/png,raw").is_err());
        assert!(LocalImage::from_data_url("data:image/png;base64,@@@").is_err());
    }

    #[tokio::test]
    async fn test_stage_mixed_images_keeps_order_and_length() {
        let host = MockHost::default();
        let mut images = vec![
            ImageRef::Remote("events/a.jpg".to_string()),
            ImageRef::parse(PNG_DATA_URL).unwrap(),
            ImageRef::Remote("events/b.jpg".to_string()),
            ImageRef::Local(LocalImage::from_bytes("stage.webp", "image/webp", vec![1, 2, 3])),
        ];

        let uploaded = stage_images(&mut images, &host).await.unwrap();
        assert_eq!(uploaded, 2);

        let paths = remote_paths(&images).unwrap();
        assert_eq!(
            paths,
            vec![
                "events/a.jpg",
                "uploads/1-upload.png",
                "events/b.jpg",
                "uploads/2-stage.webp"
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_uploaded_slots() {
        let host = MockHost {
            fail_after: Some(1),
            ..Default::default()
        };
        let mut images = vec![
            ImageRef::parse(PNG_DATA_URL).unwrap(),
            ImageRef::parse(PNG_DATA_URL).unwrap(),
        ];

        assert!(stage_images(&mut images, &host).await.is_err());
        assert!(!images[0].is_local());
        assert!(images[1].is_local());
        assert!(remote_paths(&images).is_err());
    }
}
