//! Expired Entry Sweep
//!
//! Optional pass over the whole storage that drops expired or unreadable
//! cache entries in every region. Reads already expire entries lazily, so
//! this only reclaims space held by keys nobody asks for anymore. The
//! full wipe used by `clear_all` lives here too.

use tracing::{debug, info, warn};

use crate::cache::key::is_cache_key;
use crate::cache::{Clock, EntryMeta};
use crate::storage::Storage;

/// Removes every expired or unparsable namespaced entry, across all regions
/// and versions. Returns the number of keys removed.
pub fn clear_expired(storage: &dyn Storage, clock: &dyn Clock) -> usize {
    let keys = match storage.scan_keys(&is_cache_key) {
        Ok(keys) => keys,
        Err(e) => {
            warn!("Expired cache sweep skipped: {}", e);
            return 0;
        }
    };

    let now = clock.now_ms();
    let mut stale = Vec::new();

    for key in keys {
        match storage.read(&key) {
            Ok(Some(raw)) => {
                let expired = serde_json::from_str::<EntryMeta>(&raw)
                    .map(|meta| meta.is_expired(now))
                    .unwrap_or(true);
                if expired {
                    stale.push(key);
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Expired cache sweep aborted: {}", e);
                break;
            }
        }
    }

    let removed = match storage.remove_many(&stale) {
        Ok(removed) => removed,
        Err(e) => {
            warn!("Expired cache sweep could not remove entries: {}", e);
            0
        }
    };

    if removed > 0 {
        info!("Cleared {} expired cache entries", removed);
    } else {
        debug!("Expired cache sweep: nothing to remove");
    }
    removed
}

/// Removes every namespaced cache entry, expired or not, in every region
/// and version. Returns the number of keys removed.
pub fn clear_all_entries(storage: &dyn Storage) -> usize {
    let keys = match storage.scan_keys(&is_cache_key) {
        Ok(keys) => keys,
        Err(e) => {
            warn!("Clearing all cache entries failed: {}", e);
            return 0;
        }
    };

    let removed = match storage.remove_many(&keys) {
        Ok(removed) => removed,
        Err(e) => {
            warn!("Clearing all cache entries failed: {}", e);
            0
        }
    };
    info!("Cleared ALL cache entries ({} items)", removed);
    removed
}
