use std::fmt;

/// Shown when the server gave no usable message.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("form has {} invalid field(s)", .0.len())]
    Form(Vec<FieldError>),

    #[error("cannot {action} {id}: {reason}")]
    InvalidTransition {
        id: String,
        action: &'static str,
        reason: &'static str,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("socket error: {0}")]
    Socket(String),

    #[error("upload error: {0}")]
    Upload(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Text for transient user feedback: the server's own message where it
    /// sent one, otherwise a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            ClientError::Socket(m) | ClientError::Validation(m) if !m.trim().is_empty() => {
                m.clone()
            }
            ClientError::Form(errors) => errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            ClientError::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
