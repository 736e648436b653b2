//! Session token slot over a persistent key-value storage.
//!
//! The [`TokenStore`] is the only reader/writer of the session slot. It is a
//! cheap-to-clone handle, passed explicitly to the guard, the request
//! interceptors and the session facade.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use campusgate_core::ClientConfig;
use campusgate_core::config::DEFAULT_TOKEN_KEY;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// String key-value storage (browser `localStorage` equivalent).
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S> KeyValueStorage for Arc<S>
where
    S: KeyValueStorage + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Process-local storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
        Ok(())
    }
}

/// File-backed storage: one JSON object in `<dir>/storage.json`.
///
/// The directory and file are created on first write. Writes go to a
/// temporary file that is renamed over the original.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub const FILE_NAME: &'static str = "storage.json";

    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(Self::FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn write_all(&self, slots: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_vec_pretty(slots).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slots = self.read_all()?;
        slots.insert(key.to_string(), value.to_string());
        self.write_all(&slots)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slots = self.read_all()?;
        if slots.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&slots)
    }
}

/// Handle to the single persistent session-token slot.
///
/// Storage failures are logged and degrade to "no token": callers always see
/// a plain present/absent answer. Always re-read at point of use; never hold
/// a token across an `.await`.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    key: Arc<str>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        let key: String = key.into();
        Self {
            storage,
            key: Arc::from(key),
        }
    }

    /// Ephemeral store under the default slot name.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStorage::new()), DEFAULT_TOKEN_KEY)
    }

    /// File-backed store as configured.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            Arc::new(FileStorage::new(&config.storage_dir)),
            config.token_key.clone(),
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write the token; `None` or an empty token clears the slot.
    pub fn set_token(&self, token: Option<&str>) {
        match token {
            Some(token) if !token.is_empty() => {
                if let Err(err) = self.storage.set(&self.key, token) {
                    tracing::warn!(key = %self.key, error = %err, "failed to persist session token");
                }
            }
            _ => self.clear(),
        }
    }

    pub fn get_token(&self) -> Option<String> {
        match self.storage.get(&self.key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "failed to read session token; treating as absent");
                None
            }
        }
    }

    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    /// Remove the slot. Idempotent.
    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %err, "failed to clear session token");
        }
    }
}

impl core::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .field("present", &self.has_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn set_get_clear() {
        let store = TokenStore::in_memory();
        assert_eq!(store.get_token(), None);

        store.set_token(Some("abc.def.ghi"));
        assert_eq!(store.get_token().as_deref(), Some("abc.def.ghi"));

        store.clear();
        assert_eq!(store.get_token(), None);

        // Idempotent.
        store.clear();
        assert_eq!(store.get_token(), None);
    }

    #[test]
    fn setting_none_or_empty_clears() {
        let store = TokenStore::in_memory();
        store.set_token(Some("t"));
        store.set_token(None);
        assert!(!store.has_token());

        store.set_token(Some("t"));
        store.set_token(Some(""));
        assert!(!store.has_token());
    }

    #[test]
    fn clones_share_the_slot() {
        let store = TokenStore::in_memory();
        let other = store.clone();
        store.set_token(Some("shared"));
        assert_eq!(other.get_token().as_deref(), Some("shared"));
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let first = TokenStore::new(Arc::new(FileStorage::new(dir.path())), "access_token");
        first.set_token(Some("persisted"));

        let second = TokenStore::new(Arc::new(FileStorage::new(dir.path())), "access_token");
        assert_eq!(second.get_token().as_deref(), Some("persisted"));

        second.clear();
        assert_eq!(first.get_token(), None);
    }

    #[test]
    fn file_storage_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        storage.set("theme", "dark").unwrap();
        storage.set("access_token", "t").unwrap();
        storage.remove("access_token").unwrap();
        storage.remove("access_token").unwrap();

        assert_eq!(storage.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(storage.get("access_token").unwrap(), None);
    }

    #[test]
    fn corrupt_file_reads_as_absent_token() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), "{not json").unwrap();

        assert!(matches!(storage.get("access_token"), Err(StorageError::Corrupt { .. })));

        let store = TokenStore::new(Arc::new(storage), "access_token");
        assert_eq!(store.get_token(), None);
    }

    proptest! {
        #[test]
        fn round_trips_any_non_empty_token(token in ".{1,64}") {
            let store = TokenStore::in_memory();
            store.set_token(Some(token.as_str()));
            prop_assert_eq!(store.get_token(), Some(token));
            store.set_token(None);
            prop_assert_eq!(store.get_token(), None);
        }
    }
}
