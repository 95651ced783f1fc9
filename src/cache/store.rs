//! Cache Store Module
//!
//! Region-scoped, TTL-aware cache over a shared [`Storage`] port.
//!
//! Every operation is fail-open: a storage fault, a quota rejection or a
//! corrupt entry is logged and the store behaves as if the entry were
//! absent. Nothing in here returns an error to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::key::{is_region_key, NamespacedKey};
use crate::cache::sweep::clear_all_entries;
use crate::cache::stats::{CacheStats, Counters, EntryStats};
use crate::cache::{CacheEntry, Clock, EntryMeta, DEFAULT_TTL, DEFAULT_VERSION};
use crate::region::RegionCode;
use crate::storage::{Storage, StorageError};

// == Cache Options ==
/// Per-write overrides for [`CacheStore::set`].
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    pub ttl: Option<Duration>,
    pub version: Option<String>,
}

impl CacheOptions {
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

// == Cache Store ==
/// Cache bound to a single region. Keys are namespaced as
/// `{version}_{REGION}_{logicalKey}` before they reach storage.
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    region: RegionCode,
    default_ttl: Duration,
    default_version: String,
    counters: Counters,
    /// Set after the first "storage unavailable" warning
    unavailable_reported: AtomicBool,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store for `region` with a 10 minute TTL and version `v1`.
    pub fn new(region: RegionCode, storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        debug!("Cache store initialized for region: {}", region);
        Self {
            storage,
            clock,
            region,
            default_ttl: DEFAULT_TTL,
            default_version: DEFAULT_VERSION.to_string(),
            counters: Counters::default(),
            unavailable_reported: AtomicBool::new(false),
        }
    }

    /// Overrides the TTL and version used when a write does not specify them.
    /// An empty version keeps the current one.
    pub fn with_defaults(mut self, default_ttl: Duration, default_version: impl Into<String>) -> Self {
        self.default_ttl = default_ttl;
        let default_version = default_version.into();
        if !default_version.is_empty() {
            self.default_version = default_version;
        }
        self
    }

    pub fn region(&self) -> &RegionCode {
        &self.region
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Builds the storage key for `logical_key` under this store's region.
    pub fn namespaced_key(&self, logical_key: &str, version: Option<&str>) -> NamespacedKey {
        let version = version
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_version);
        NamespacedKey::new(version, self.region.clone(), logical_key)
    }

    // == Get ==
    /// Returns the live payload stored under `logical_key`, if any.
    ///
    /// Expired entries are removed on the way out. Entries that fail to
    /// decode as `T` are logged once, removed, and reported as a miss.
    pub fn get<T: DeserializeOwned>(&mut self, logical_key: &str, version: Option<&str>) -> Option<T> {
        let key = self.namespaced_key(logical_key, version).to_string();

        let raw = match self.storage.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                self.counters.record_miss();
                return None;
            }
            Err(e) => {
                self.report_fault("read", &key, e);
                self.counters.record_miss();
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Corrupt cache entry {} dropped: {}", key, e);
                self.remove_quietly(&key);
                self.counters.record_miss();
                return None;
            }
        };

        let now = self.clock.now_ms();
        if entry.is_expired(now) {
            debug!(
                "Cache EXPIRED: {} (age: {}s, ttl: {}s)",
                key,
                entry.age_ms(now) / 1000,
                entry.ttl / 1000
            );
            self.remove_quietly(&key);
            self.counters.record_miss();
            return None;
        }

        debug!("Cache HIT: {} (age: {}s)", key, entry.age_ms(now) / 1000);
        self.counters.record_hit();
        Some(entry.data)
    }

    // == Set ==
    /// Stores `data` under `logical_key`, replacing any previous entry.
    ///
    /// A write that cannot be encoded or persisted is logged and dropped;
    /// later reads simply miss.
    pub fn set<T: Serialize>(&mut self, logical_key: &str, data: &T, options: CacheOptions) {
        let ttl = options.ttl.unwrap_or(self.default_ttl);
        let key = self
            .namespaced_key(logical_key, options.version.as_deref())
            .to_string();
        let version = options
            .version
            .unwrap_or_else(|| self.default_version.clone());

        let entry = CacheEntry::new(data, self.clock.now_ms(), ttl.as_millis() as u64, version);
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache SET skipped for {}: cannot encode entry: {}", key, e);
                return;
            }
        };

        match self.storage.write(&key, &raw) {
            Ok(()) => debug!("Cache SET: {} (ttl: {}s)", key, ttl.as_secs()),
            Err(e) => self.report_fault("write", &key, e),
        }
    }

    // == Invalidate ==
    /// Removes the entry for `logical_key`. No-op if absent.
    pub fn invalidate(&mut self, logical_key: &str, version: Option<&str>) {
        let key = self.namespaced_key(logical_key, version).to_string();
        match self.storage.remove(&key) {
            Ok(()) => debug!("Cache INVALIDATED: {}", key),
            Err(e) => self.report_fault("remove", &key, e),
        }
    }

    // == Has ==
    /// Checks whether an entry is stored, without looking at its TTL.
    ///
    /// An expired entry that has not been read since it expired still
    /// counts. Meant for inspection only.
    pub fn has(&self, logical_key: &str, version: Option<&str>) -> bool {
        let key = self.namespaced_key(logical_key, version).to_string();
        match self.storage.read(&key) {
            Ok(found) => found.is_some(),
            Err(e) => {
                self.report_fault("read", &key, e);
                false
            }
        }
    }

    // == Clear Region ==
    /// Removes every entry of this region, across all versions.
    ///
    /// Returns the number of keys removed.
    pub fn clear_region(&mut self) -> usize {
        let region = self.region.clone();
        let keys = match self.storage.scan_keys(&|k: &str| is_region_key(k, &region)) {
            Ok(keys) => keys,
            Err(e) => {
                self.report_fault("scan", region.as_str(), e);
                return 0;
            }
        };

        let removed = self.remove_all(&keys);
        info!("Cleared {} cache entries for region: {}", removed, self.region);
        removed
    }

    // == Clear All ==
    /// Removes every namespaced cache entry in storage, for all regions and
    /// versions. Other keys in the same storage are left alone.
    pub fn clear_all(&mut self) -> usize {
        clear_all_entries(self.storage.as_ref())
    }

    // == Stats ==
    /// Scans this region's entries. Never modifies storage; entries that do
    /// not parse are skipped.
    pub fn get_stats(&self) -> CacheStats {
        let region = self.region.clone();
        let now = self.clock.now_ms();

        let keys = match self.storage.scan_keys(&|k: &str| is_region_key(k, &region)) {
            Ok(keys) => keys,
            Err(e) => {
                self.report_fault("scan", region.as_str(), e);
                Vec::new()
            }
        };

        let entries: Vec<EntryStats> = keys
            .into_iter()
            .filter_map(|key| {
                let raw = self.storage.read(&key).ok().flatten()?;
                let meta: EntryMeta = serde_json::from_str(&raw).ok()?;
                Some(EntryStats::new(key, meta.age_ms(now), raw.len()))
            })
            .collect();

        CacheStats {
            region: self.region.to_string(),
            total_entries: entries.len(),
            entries,
            hits: self.counters.hits,
            misses: self.counters.misses,
            hit_rate: self.counters.hit_rate(),
        }
    }

    // == Helpers ==
    fn remove_all(&self, keys: &[String]) -> usize {
        match self.storage.remove_many(keys) {
            Ok(removed) => removed,
            Err(e) => {
                self.report_fault("remove", self.region.as_str(), e);
                0
            }
        }
    }

    fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            self.report_fault("remove", key, e);
        }
    }

    /// Logs a storage fault. Unavailability is reported once per store so a
    /// disabled backend does not flood the log.
    fn report_fault(&self, op: &str, key: &str, err: StorageError) {
        match err {
            StorageError::Unavailable(_) => {
                if !self.unavailable_reported.swap(true, Ordering::Relaxed) {
                    warn!("[{}] Cache storage unavailable, caching disabled: {}", self.region, err);
                } else {
                    debug!("[{}] Cache {} skipped for {}: {}", self.region, op, key, err);
                }
            }
            other => warn!("[{}] Cache {} failed for {}: {}", self.region, op, key, other),
        }
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("region", &self.region)
            .field("default_ttl", &self.default_ttl)
            .field("default_version", &self.default_version)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
