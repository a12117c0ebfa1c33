//! Common library for the PickMe client
//!
//! This crate provides functionality shared by the API client, the session
//! layer and the front-end: configuration loading, persisted token storage
//! and error types.
//!
//! ```rust,no_run
//! use common::{ClientConfig, FileStore, TokenPair, TokenStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let tokens = TokenStore::new(FileStore::open(&config.token_file)?);
//!     tokens.save(&TokenPair {
//!         access: "access".to_string(),
//!         refresh: "refresh".to_string(),
//!     })?;
//!     println!("Session present: {}", tokens.has_session()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fields;
pub mod storage;

pub use config::ClientConfig;
pub use error::{ConfigError, StorageError, StorageResult};
pub use fields::FieldErrors;
pub use storage::{FileStore, KeyValueStore, MemoryStore, TokenPair, TokenStore};
