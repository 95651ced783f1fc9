//! Storage Module
//!
//! The persistent key-value substrate the cache sits on. The cache only ever
//! talks to the [`Storage`] port, so tests can run against an in-memory map
//! and the server against a file that survives restarts.

mod file;
mod memory;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

// == Public Constants ==
/// Default storage budget in bytes (keys + values), matching a browser origin.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

// == Storage Error ==
/// Failures raised by a storage backend.
///
/// The cache never forwards these to its callers; they are logged and the
/// operation degrades to a miss or a no-op.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend is disabled, blocked or otherwise unreadable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Write would push the backend past its byte budget
    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Persisting the backing file failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Storage Port ==
/// Origin-wide key-value storage shared by every region and version.
///
/// Implementations serialize access internally; callers hold a shared
/// reference and never lock around individual calls.
pub trait Storage: Send + Sync {
    /// Reads the raw value stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Returns every stored key accepted by `predicate`.
    fn scan_keys(&self, predicate: &dyn Fn(&str) -> bool) -> Result<Vec<String>, StorageError>;

    /// Removes every key in `keys` as one batch. Returns how many were
    /// present.
    ///
    /// Backends with a costly commit step should override this to commit
    /// once per batch.
    fn remove_many(&self, keys: &[String]) -> Result<usize, StorageError> {
        let mut removed = 0;
        for key in keys {
            if self.read(key)?.is_some() {
                self.remove(key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Checks whether replacing `key` with `value` keeps `entries` within `quota`.
///
/// Size is measured as key bytes plus value bytes, summed over all entries.
pub(crate) fn check_quota<'a, I>(
    entries: I,
    key: &str,
    value: &str,
    quota: Option<usize>,
) -> Result<(), StorageError>
where
    I: Iterator<Item = (&'a String, &'a String)>,
{
    let Some(quota) = quota else {
        return Ok(());
    };

    let others: usize = entries
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum();
    let needed = others + key.len() + value.len();

    if needed > quota {
        return Err(StorageError::QuotaExceeded { needed, quota });
    }
    Ok(())
}
