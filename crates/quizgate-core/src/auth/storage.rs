//! Persistence media for the credential store.
//!
//! A medium is a small string key-value map. Every operation takes a batch
//! of keys and applies it as a unit, so the token and user record can never
//! be observed half-written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use keyring::Entry;
use thiserror::Error;
use tracing::{debug, warn};

/// Session file name in cache directory
pub const SESSION_FILE: &str = "session.json";

/// Keychain service name used by [`KeyringStorage`]
const SERVICE_NAME: &str = "quizgate";

/// Keychain account holding the serialized key-value map
const KEYRING_ACCOUNT: &str = "session";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize stored values: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// String key-value storage that survives restarts.
pub trait KeyValueStorage: Send + Sync {
    /// Read several keys at once; missing keys come back as `None`.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError>;

    /// Write several entries as one unit.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;

    /// Remove several keys as one unit. Missing keys are ignored.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Every write replaces whole batches, so a poisoned map is still consistent
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn pick(map: &HashMap<String, String>, keys: &[&str]) -> Vec<Option<String>> {
    keys.iter().map(|k| map.get(*k).cloned()).collect()
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local storage. Used for tests and sessions that should not persist.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a single raw value, bypassing batching. Handy for seeding
    /// corrupt or partial state in tests.
    pub fn insert_raw(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        Ok(pick(&lock(&self.values), keys))
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut values = lock(&self.values);
        for (key, value) in entries {
            values.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut values = lock(&self.values);
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// Storage backed by a JSON object file, e.g. `~/.cache/quizgate/session.json`.
///
/// Writes go to a temp file that is renamed over the target, so readers see
/// either the old map or the new one.
pub struct FileStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            guard: Mutex::new(()),
        }
    }

    /// Storage at `<cache_dir>/session.json`
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self::new(cache_dir.join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unreadable or corrupt files read as empty; the next write replaces them.
    fn read_map(&self) -> HashMap<String, String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return HashMap::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
                HashMap::new()
            }
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if map.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Session file written");
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let _guard = lock(&self.guard);
        Ok(pick(&self.read_map(), keys))
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let _guard = lock(&self.guard);
        let mut map = self.read_map();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.write_map(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = lock(&self.guard);
        let mut map = self.read_map();
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map)
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Storage in the OS keychain. The whole map lives in a single keychain
/// entry so batches stay atomic.
pub struct KeyringStorage {
    guard: Mutex<()>,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self {
            guard: Mutex::new(()),
        }
    }

    fn entry() -> Result<Entry, StorageError> {
        Ok(Entry::new(SERVICE_NAME, KEYRING_ACCOUNT)?)
    }

    fn read_map(entry: &Entry) -> Result<HashMap<String, String>, StorageError> {
        match entry.get_password() {
            Ok(secret) => Ok(serde_json::from_str(&secret).unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring corrupt keychain session entry");
                HashMap::new()
            })),
            Err(keyring::Error::NoEntry) => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(entry: &Entry, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if map.is_empty() {
            return match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e.into()),
            };
        }
        entry.set_password(&serde_json::to_string(map)?)?;
        Ok(())
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for KeyringStorage {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let _guard = lock(&self.guard);
        let entry = Self::entry()?;
        Ok(pick(&Self::read_map(&entry)?, keys))
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let _guard = lock(&self.guard);
        let entry = Self::entry()?;
        let mut map = Self::read_map(&entry)?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Self::write_map(&entry, &map)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = lock(&self.guard);
        let entry = Self::entry()?;
        let mut map = Self::read_map(&entry)?;
        for key in keys {
            map.remove(*key);
        }
        Self::write_map(&entry, &map)
    }
}
