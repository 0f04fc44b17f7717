//! Durable key-value storage.
//!
//! Small JSON-encoded values keyed by string, surviving process
//! restarts. The location provider persists the current location and
//! the saved-locations list through this interface.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Value encoding failed: {0}")]
    Encode(String),
}

/// Synchronous get/set of small string values.
///
/// Values are expected to be JSON-encoded by the caller; the store
/// itself treats them as opaque.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed store: one file per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created on first write, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys become file names, so path separators are rejected.
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, value)?;
        tracing::debug!(key, path = %path.display(), "stored value");
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
