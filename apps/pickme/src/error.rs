//! Custom error types for the PickMe pages

use api::{ApiError, ErrorKind};
use auth::AuthError;
use common::{FieldErrors, StorageError};
use thiserror::Error;

/// Custom error type for page actions
#[derive(Error, Debug)]
pub enum AppError {
    /// A form failed local checks; nothing was sent
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    /// The page needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// The action is only allowed on the user's own content
    #[error("{0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Token storage error: {0}")]
    Storage(#[from] StorageError),

    /// Reading a file to upload failed
    #[error("Failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotSignedIn => ErrorKind::Authorization,
            AppError::Api(e) => e.kind(),
            AppError::Auth(e) => e.kind(),
            _ => ErrorKind::Request,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation(errors) => Some(errors),
            AppError::Api(e) => e.field_errors(),
            AppError::Auth(e) => e.field_errors(),
            _ => None,
        }
    }

    /// Message for a notification, falling back to `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Api(e) => e.user_message(fallback),
            AppError::Auth(e) => e.user_message(fallback),
            AppError::Validation(errors) => errors.to_string(),
            AppError::NotSignedIn => "Please sign in".to_string(),
            AppError::Forbidden(message) => message.to_string(),
            AppError::Storage(_) | AppError::File { .. } => fallback.to_string(),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Type alias for page results
pub type AppResult<T> = Result<T, AppError>;
