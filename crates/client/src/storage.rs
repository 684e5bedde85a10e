//! Durable client-side key-value store.
//!
//! Models the browser's localStorage: JSON strings under fixed names, read
//! at process start and written on every relevant state change. Writes never
//! fail the caller - a storage failure is logged and the in-memory state
//! stays authoritative, the same way a rejected localStorage write does not
//! crash a page.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Fixed storage key names.
///
/// These match the names the platform has always used, so an existing data
/// directory keeps working across client versions.
pub mod keys {
    /// Bearer access token.
    pub const ACCESS_TOKEN: &str = "accessToken";
    /// Refresh token.
    pub const REFRESH_TOKEN: &str = "refreshToken";
    /// Cached authenticated-user snapshot.
    pub const CURRENT_USER: &str = "current_user";
    /// Persisted admin notification list.
    pub const ADMIN_NOTIFICATIONS: &str = "admin_notifications";
    /// In-flight checkout payment record.
    pub const PENDING_PAYMENT: &str = "pending_checkout_payment";
}

/// A durable string store keyed by fixed names.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if present.
    fn get(&self, key: &str) -> Option<String>;
    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str);
    /// Delete the value under `key`, if present.
    fn remove(&self, key: &str);
}

/// Read and deserialize a JSON value.
///
/// A missing key or an unparsable value both read as `None`; the parse
/// failure is logged, matching how a corrupted localStorage entry is
/// treated as absent.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding unparsable stored value");
            None
        }
    }
}

/// Serialize and write a JSON value.
pub fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.put(key, &raw),
        Err(e) => warn!(key, error = %e, "Failed to serialize value for storage"),
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// File-backed store: one file per key under a data directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed names, but sanitize anyway so a hostile key cannot
        // escape the data directory.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn put(&self, key: &str, value: &str) {
        let path = self.path_for(key);
        if let Err(e) = std::fs::write(&path, value) {
            warn!(key, path = %path.display(), error = %e, "Failed to persist value");
        }
    }

    fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(e) = std::fs::remove_file(&path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(key, path = %path.display(), error = %e, "Failed to remove value");
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: &str) {
        self.map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}
