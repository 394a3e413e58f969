//! Durable key-value storage capability.
//!
//! The preset store persists through [`KeyValueStore`] rather than a
//! concrete backend so it can run against an in-memory map in tests and a
//! JSON file on disk in the CLI. Implementations use interior mutability;
//! there is a single writer per store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::CoreError;

/// String-keyed, string-valued durable storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        (**self).remove(key)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Store persisted as a single JSON object file (`{"key": "value", ...}`).
///
/// The whole file is rewritten on every `set`/`remove` via a sibling
/// temporary file and a rename. A missing file reads as empty. A file
/// that cannot be parsed also reads as empty (logged), and is replaced on
/// the next write. A file that exists but cannot be read is an error.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, CoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(CoreError::Storage(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_str(&text).map_err(|e| {
            CoreError::Format(format!("{} is not a valid store file: {e}", self.path.display()))
        })
    }

    /// Entries to start a write from. A file that does not parse starts
    /// over empty; a file that cannot be read fails the write.
    fn entries_for_write(&self) -> Result<BTreeMap<String, String>, CoreError> {
        match self.read_entries() {
            Err(CoreError::Format(reason)) => {
                tracing::warn!(path = %self.path.display(), %reason, "Discarding corrupt store file");
                Ok(BTreeMap::new())
            }
            result => result,
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::Storage(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| CoreError::Storage(format!("Failed to encode store: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| CoreError::Storage(format!("Failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            CoreError::Storage(format!("Failed to replace {}: {e}", self.path.display()))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match self.read_entries() {
            Ok(mut entries) => Ok(entries.remove(key)),
            Err(CoreError::Format(reason)) => {
                tracing::warn!(path = %self.path.display(), %reason, "Store file is corrupt, reading as empty");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.entries_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.entries_for_write()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
