use std::env;

use crate::errors::{ClientError, Result};
use crate::models::{Role, Session};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub image_base_url: String,
    pub upload_url: String,
    pub upload_preset: String,
    pub upload_api_key: Option<String>,
    pub upload_api_secret: Option<String>,
    pub state_db_path: String,
    pub page_size: u32,
    pub session_user_id: Option<String>,
    pub session_role: Option<String>,
    pub session_token: Option<String>,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
            image_base_url: env::var("IMAGE_BASE_URL").unwrap_or_default(),
            upload_url: env::var("UPLOAD_URL").unwrap_or_default(),
            upload_preset: env::var("UPLOAD_PRESET").unwrap_or_default(),
            upload_api_key: non_empty("UPLOAD_API_KEY"),
            upload_api_secret: non_empty("UPLOAD_API_SECRET"),
            state_db_path: env::var("STATE_DB_PATH")
                .unwrap_or_else(|_| "marketplace-state.db".to_string()),
            page_size: env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            session_user_id: non_empty("SESSION_USER_ID"),
            session_role: non_empty("SESSION_ROLE"),
            session_token: non_empty("SESSION_TOKEN"),
        }
    }

    /// Signed uploads need both halves of the credential.
    pub fn upload_credentials(&self) -> Option<(&str, &str)> {
        match (&self.upload_api_key, &self.upload_api_secret) {
            (Some(key), Some(secret)) => Some((key.as_str(), secret.as_str())),
            _ => None,
        }
    }

    /// Session given through the environment, for headless runs. All three
    /// variables must be set together.
    pub fn bootstrap_session(&self) -> Result<Option<Session>> {
        match (&self.session_user_id, &self.session_role, &self.session_token) {
            (None, None, None) => Ok(None),
            (Some(user_id), Some(role), Some(token)) => {
                let role = Role::parse(role).ok_or_else(|| {
                    ClientError::Config(format!("SESSION_ROLE '{role}' is not admin, vendor or client"))
                })?;
                Ok(Some(Session {
                    user_id: user_id.clone(),
                    role,
                    token: token.clone(),
                }))
            }
            _ => Err(ClientError::Config(
                "SESSION_USER_ID, SESSION_ROLE and SESSION_TOKEN must be set together".to_string(),
            )),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            image_base_url: String::new(),
            upload_url: String::new(),
            upload_preset: String::new(),
            upload_api_key: None,
            upload_api_secret: None,
            state_db_path: ":memory:".to_string(),
            page_size: 10,
            session_user_id: None,
            session_role: None,
            session_token: None,
        }
    }
}
