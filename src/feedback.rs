use serde::Serialize;

use crate::errors::ClientError;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

/// Transient user feedback after an action.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    /// Uses the server's message when it sent a non-empty one.
    pub fn success(server_message: Option<String>, default: &str) -> Self {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default.to_string());
        Self {
            kind: ToastKind::Success,
            message,
        }
    }

    pub fn error(err: &ClientError) -> Self {
        Self {
            kind: ToastKind::Error,
            message: err.user_message(),
        }
    }

    pub fn from_result(result: &Result<Toast, ClientError>) -> Self {
        match result {
            Ok(toast) => toast.clone(),
            Err(e) => Toast::error(e),
        }
    }
}
