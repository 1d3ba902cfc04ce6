use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::forms::LocalImage;
use crate::media::to_stored_path;

/// Third-party image hosting. Returns the reference to persist for the image.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &LocalImage) -> Result<String>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct UploadErrorBody {
    error: UploadErrorDetail,
}

#[derive(Deserialize)]
struct UploadErrorDetail {
    message: String,
}

/// Cloudinary-style unsigned (preset) or signed multipart upload.
pub struct CloudinaryHost {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
    credentials: Option<(String, String)>,
    image_base_url: String,
}

impl CloudinaryHost {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if config.upload_url.is_empty() {
            return Err(ClientError::Config("UPLOAD_URL is not set".to_string()));
        }
        if config.upload_preset.is_empty() && config.upload_credentials().is_none() {
            return Err(ClientError::Config(
                "UPLOAD_PRESET or UPLOAD_API_KEY/UPLOAD_API_SECRET must be set".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            upload_url: config.upload_url.clone(),
            upload_preset: config.upload_preset.clone(),
            credentials: config
                .upload_credentials()
                .map(|(key, secret)| (key.to_string(), secret.to_string())),
            image_base_url: config.image_base_url.clone(),
        })
    }

    fn form_fields(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if !self.upload_preset.is_empty() {
            fields.push(("upload_preset", self.upload_preset.clone()));
        }
        if let Some((api_key, secret)) = &self.credentials {
            let timestamp = timestamp.to_string();
            let mut signed: Vec<(&str, &str)> = vec![("timestamp", timestamp.as_str())];
            if !self.upload_preset.is_empty() {
                signed.push(("upload_preset", self.upload_preset.as_str()));
            }
            let signature = sign(&signed, secret);
            fields.push(("timestamp", timestamp.clone()));
            fields.push(("api_key", api_key.clone()));
            fields.push(("signature", signature));
        }
        fields
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, image: &LocalImage) -> Result<String> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime)?;
        let mut form = Form::new().part("file", part);
        for (name, value) in self.form_fields(chrono::Utc::now().timestamp()) {
            form = form.text(name, value);
        }

        let resp = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<UploadErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("image host returned {status}"));
            tracing::error!(status = %status, file = %image.file_name, "image upload rejected");
            return Err(ClientError::Upload(message));
        }

        let uploaded: UploadResponse = resp.json().await?;
        let stored = to_stored_path(&self.image_base_url, &uploaded.secure_url);
        tracing::info!(file = %image.file_name, stored = %stored, "image uploaded");
        Ok(stored)
    }
}

/// Sorted `key=value` pairs joined by `&`, with the secret appended, SHA-1 hex.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(signed: bool) -> ClientConfig {
        ClientConfig {
            upload_url: "https://api.cloudinary.com/v1_1/demo/image/upload".to_string(),
            upload_preset: "marketplace".to_string(),
            upload_api_key: signed.then(|| "1234".to_string()),
            upload_api_secret: signed.then(|| "abcd".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_signature_ignores_param_order() {
        let sig = sign(
            &[("timestamp", "1315060510"), ("public_id", "sample_image")],
            "abcd",
        );
        assert_eq!(sig.len(), 40);
        assert_eq!(
            sig,
            sign(
                &[("public_id", "sample_image"), ("timestamp", "1315060510")],
                "abcd"
            )
        );
    }

    #[test]
    fn test_unsigned_fields_only_carry_preset() {
        let host = CloudinaryHost::new(&config(false)).unwrap();
        let fields = host.form_fields(1_700_000_000);
        assert_eq!(fields, vec![("upload_preset", "marketplace".to_string())]);
    }

    #[test]
    fn test_signed_fields() {
        let host = CloudinaryHost::new(&config(true)).unwrap();
        let fields = host.form_fields(1_700_000_000);
        let names: Vec<&str> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["upload_preset", "timestamp", "api_key", "signature"]);
        assert_eq!(
            fields[3].1,
            sign(
                &[("timestamp", "1700000000"), ("upload_preset", "marketplace")],
                "abcd"
            )
        );
    }

    #[test]
    fn test_missing_upload_url_is_config_error() {
        let err = CloudinaryHost::new(&ClientConfig::default()).err().unwrap();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
