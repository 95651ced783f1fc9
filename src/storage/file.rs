//! File-Backed Storage
//!
//! Keeps the whole key space in memory and mirrors it to a single JSON
//! object on disk after every mutation, so cached entries and preferences
//! survive a restart.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use super::{check_quota, Storage, StorageError};

// == File Storage ==
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl FileStorage {
    // == Constructor ==
    /// Opens the storage file at `path`, creating an empty store if it does
    /// not exist yet.
    ///
    /// A file that cannot be parsed is treated as empty and will be replaced
    /// on the next write.
    pub fn open(path: impl AsRef<Path>, quota: Option<usize>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => {
                    debug!("Loaded {} keys from {}", map.len(), path.display());
                    map
                }
                Err(e) => {
                    warn!("Storage file {} is corrupt, starting empty: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            quota,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Persist ==
    /// Writes the map to a sibling temp file and renames it over the target.
    fn persist(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let body = serde_json::to_string(map)
            .map_err(|e| StorageError::Unavailable(format!("cannot encode storage: {}", e)))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        check_quota(map.iter(), key, value, self.quota)?;

        let previous = map.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&map) {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => map.insert(key.to_string(), old),
                None => map.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;

        let Some(previous) = map.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&map) {
            map.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn scan_keys(&self, predicate: &dyn Fn(&str) -> bool) -> Result<Vec<String>, StorageError> {
        let map = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        Ok(map.keys().filter(|k| predicate(k)).cloned().collect())
    }

    /// Removes the batch in memory and rewrites the file once.
    fn remove_many(&self, keys: &[String]) -> Result<usize, StorageError> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;

        let removed: Vec<(String, String)> = keys
            .iter()
            .filter_map(|key| map.remove_entry(key.as_str()))
            .collect();
        if removed.is_empty() {
            return Ok(0);
        }
        if let Err(e) = self.persist(&map) {
            map.extend(removed);
            return Err(e);
        }
        Ok(removed.len())
    }
}
