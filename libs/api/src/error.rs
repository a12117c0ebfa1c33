//! Custom error types for the API client

use common::{FieldErrors, StorageError};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Custom error type for the API client
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server rejected the credentials, after any refresh attempt
    #[error("Unauthorized")]
    Unauthorized { detail: Option<String> },

    /// The server rejected the payload field by field
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Any other non-success status
    #[error("Request failed with status {status}")]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    /// Connection, timeout or body decoding failure
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request body could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Reading or writing the stored tokens failed
    #[error("Token storage error: {0}")]
    Storage(#[from] StorageError),
}

/// How the user-facing layer should treat an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Show the messages next to the offending form fields
    Validation,
    /// The session is gone; the user has to log in again
    Authorization,
    /// Show a transient notification
    Request,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Unauthorized { .. } => ErrorKind::Authorization,
            _ => ErrorKind::Request,
        }
    }

    /// HTTP status, when the error came from a response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Validation(_) => Some(StatusCode::BAD_REQUEST),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// The server's `detail` message, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Message suitable for a notification, falling back to `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(detail) = self.detail() {
            return detail.to_string();
        }
        match self {
            ApiError::Validation(errors) => errors.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Build the error for a non-success response, consuming its body
    pub(crate) async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .ok()
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .unwrap_or(Value::Null);
        Self::from_parts(status, &body)
    }

    pub(crate) fn from_parts(status: StatusCode, body: &Value) -> Self {
        let detail = body
            .get("detail")
            .and_then(Value::as_str)
            .map(str::to_string);

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { detail },
            StatusCode::BAD_REQUEST if detail.is_none() && body.is_object() => {
                ApiError::Validation(FieldErrors::from_json(body))
            }
            _ => ApiError::Status { status, detail },
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
