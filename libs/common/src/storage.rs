//! Client-side token storage
//!
//! The client persists exactly two strings, the access token and the refresh
//! token, under fixed keys. This module provides the key-value store those
//! tokens live in and a typed [`TokenStore`] wrapper used by the request
//! pipeline and the session.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// A string key-value store
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Set a key-value pair
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a key; deleting a missing key is not an error
    fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Volatile store, lost when the process exits
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk
///
/// Every write rewrites the whole file. The file is small (two tokens), so
/// there is no attempt at partial updates. Writes go through a temporary file
/// in the same directory that is renamed over the old one, and the file is
/// only readable by its owner.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl FileStore {
    /// Open the store at `path`, creating nothing until the first write
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries: HashMap<String, String> = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring unreadable token file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        debug!("Opened token file {} with {} keys", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> StorageResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|source| StorageError::Io {
            path: parent.to_path_buf(),
            source,
        })?;

        let raw = serde_json::to_string_pretty(entries).map_err(StorageError::Corrupt)?;
        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        // NamedTempFile is created with mode 0600 on unix
        let mut file = NamedTempFile::new_in(parent).map_err(io_err)?;
        file.write_all(raw.as_bytes()).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Access and refresh token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Typed view over a [`KeyValueStore`] holding the session tokens
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Token store that forgets everything on exit
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn access_token(&self) -> StorageResult<Option<String>> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> StorageResult<Option<String>> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Replace the access token, leaving the refresh token untouched
    pub fn set_access_token(&self, token: &str) -> StorageResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, token)
    }

    /// Persist a freshly issued pair
    pub fn save(&self, pair: &TokenPair) -> StorageResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, &pair.access)?;
        self.store.set(REFRESH_TOKEN_KEY, &pair.refresh)?;
        info!("Stored new session tokens");
        Ok(())
    }

    /// Remove both tokens
    pub fn clear(&self) -> StorageResult<()> {
        self.store.delete(ACCESS_TOKEN_KEY)?;
        self.store.delete(REFRESH_TOKEN_KEY)?;
        info!("Cleared session tokens");
        Ok(())
    }

    /// Whether an access token is present
    pub fn has_session(&self) -> StorageResult<bool> {
        Ok(self.access_token()?.is_some())
    }
}
