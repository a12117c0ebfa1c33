//! Custom error types for the session layer

use api::{ApiError, ErrorKind};
use common::{FieldErrors, StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The form was rejected before anything was sent
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Token storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::Api(e) => e.kind(),
            AuthError::Storage(_) => ErrorKind::Request,
        }
    }

    /// Field messages, whether they came from local checks or the server
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AuthError::Validation(errors) => Some(errors),
            AuthError::Api(e) => e.field_errors(),
            AuthError::Storage(_) => None,
        }
    }

    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AuthError::Validation(errors) => errors.to_string(),
            AuthError::Api(e) => e.user_message(fallback),
            AuthError::Storage(_) => fallback.to_string(),
        }
    }
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        AuthError::Validation(errors)
    }
}

/// Type alias for session results
pub type AuthResult<T> = Result<T, AuthError>;
