//! In-Memory Storage
//!
//! Process-local backend used by tests and by the server when no storage
//! path is configured.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::{check_quota, Storage, StorageError};

// == Memory Storage ==
/// Ordered map guarded by a lock, with an optional byte quota.
#[derive(Debug)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
    available: AtomicBool,
}

impl MemoryStorage {
    /// Creates an empty, unbounded storage.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: None,
            available: AtomicBool::new(true),
        }
    }

    /// Creates an empty storage that rejects writes beyond `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Enables or disables the backend. A disabled backend fails every call
    /// with [`StorageError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored keys, including non-cache keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("storage disabled".to_string()))
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.ensure_available()?;
        let map = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        check_quota(map.iter(), key, value, self.quota)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        map.remove(key);
        Ok(())
    }

    fn remove_many(&self, keys: &[String]) -> Result<usize, StorageError> {
        self.ensure_available()?;
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        Ok(keys.iter().filter(|key| map.remove(key.as_str()).is_some()).count())
    }

    fn scan_keys(&self, predicate: &dyn Fn(&str) -> bool) -> Result<Vec<String>, StorageError> {
        self.ensure_available()?;
        let map = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        Ok(map.keys().filter(|k| predicate(k)).cloned().collect())
    }
}
