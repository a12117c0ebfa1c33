//! Custom error types for the common library
//!
//! This module defines the errors raised by client-side storage and
//! configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Custom error type for token storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing file could not be read or written
    #[error("Token storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The token map could not be serialized
    #[error("Token storage is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// A lock guarding the in-memory map was poisoned by a panicking writer
    #[error("Token storage lock poisoned")]
    Poisoned,
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be loaded or deserialized
    #[error("Client configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was loaded but is unusable
    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Type alias for Result with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
