//! Region Cache Facade
//!
//! Binds a [`CacheStore`] to the active region and exposes the
//! request-shaped API used by product listings.
//!
//! The facade starts unbound and is bound on the first region resolution.
//! A region change clears the *previous* region's entries and then rebinds;
//! the new region's existing entries stay usable. While unbound every
//! operation behaves like an empty cache.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{
    clear_all_entries, clear_expired, CacheOptions, CacheStats, CacheStore, Clock, DEFAULT_TTL,
    DEFAULT_VERSION,
};
use crate::region::{RegionConfig, RegionResolver};
use crate::request::{gift_key, RecommendationRequest};
use crate::storage::Storage;

/// TTL for gift-consultant suggestions
pub const GIFT_TTL: Duration = Duration::from_secs(5 * 60);

// == Binding ==
enum Binding {
    Unbound,
    Bound {
        region: RegionConfig,
        store: CacheStore,
    },
}

// == Region Cache Facade ==
pub struct RegionCacheFacade {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    version: String,
    binding: Binding,
}

impl RegionCacheFacade {
    // == Constructor ==
    /// Creates an unbound facade over `storage`.
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            default_ttl: DEFAULT_TTL,
            version: DEFAULT_VERSION.to_string(),
            binding: Binding::Unbound,
        }
    }

    /// Sets the TTL and version applied to stores created by this facade.
    pub fn with_defaults(mut self, default_ttl: Duration, version: impl Into<String>) -> Self {
        self.default_ttl = default_ttl;
        self.version = version.into();
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Active region, or `None` while unbound.
    pub fn region(&self) -> Option<&RegionConfig> {
        match &self.binding {
            Binding::Unbound => None,
            Binding::Bound { region, .. } => Some(region),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound { .. })
    }

    // == Resolve ==
    /// Runs region detection and binds (or rebinds) to the result.
    pub fn resolve(&mut self, resolver: &dyn RegionResolver) -> RegionConfig {
        let detected = resolver.detect();
        self.on_region_change(detected);
        detected
    }

    // == Region Change ==
    /// Moves the facade to `new_region`.
    ///
    /// From unbound this just binds. From another region it clears the old
    /// region's entries first, then binds a store for the new one. Switching
    /// to the already active region changes nothing.
    pub fn on_region_change(&mut self, new_region: RegionConfig) {
        let previous = std::mem::replace(&mut self.binding, Binding::Unbound);

        match previous {
            Binding::Bound { region, store } if region.code == new_region.code => {
                debug!("Region unchanged: {}", region.code);
                self.binding = Binding::Bound { region, store };
                return;
            }
            Binding::Bound { region, mut store } => {
                let cleared = store.clear_region();
                info!(
                    "Region changed {} -> {}, cleared {} stale entries",
                    region.code, new_region.code, cleared
                );
            }
            Binding::Unbound => info!("Cache bound to region: {}", new_region.code),
        }

        let store = CacheStore::new(new_region.region_code(), self.storage.clone(), self.clock.clone())
            .with_defaults(self.default_ttl, self.version.clone());
        self.binding = Binding::Bound {
            region: new_region,
            store,
        };
    }

    // == Derive Key ==
    /// Logical key for `request`. Pure and independent of filter order.
    pub fn derive_key(request: &RecommendationRequest) -> String {
        request.logical_key()
    }

    // == Request-Shaped API ==
    pub fn get_cached<T: DeserializeOwned>(&mut self, request: &RecommendationRequest) -> Option<T> {
        self.get_by_key(&Self::derive_key(request))
    }

    /// Stores `data` for `request`; `ttl` falls back to the facade default.
    pub fn set_cached<T: Serialize>(
        &mut self,
        request: &RecommendationRequest,
        data: &T,
        ttl: Option<Duration>,
    ) {
        let options = CacheOptions {
            ttl,
            version: None,
        };
        self.set_by_key(&Self::derive_key(request), data, options);
    }

    pub fn invalidate_cached(&mut self, request: &RecommendationRequest) {
        self.invalidate_by_key(&Self::derive_key(request));
    }

    // == Key-Shaped API ==
    pub fn get_by_key<T: DeserializeOwned>(&mut self, logical_key: &str) -> Option<T> {
        match &mut self.binding {
            Binding::Bound { store, .. } => store.get(logical_key, None),
            Binding::Unbound => {
                debug!("Cache unbound, treating {} as a miss", logical_key);
                None
            }
        }
    }

    pub fn set_by_key<T: Serialize>(&mut self, logical_key: &str, data: &T, options: CacheOptions) {
        match &mut self.binding {
            Binding::Bound { store, .. } => store.set(logical_key, data, options),
            Binding::Unbound => debug!("Cache unbound, dropping write for {}", logical_key),
        }
    }

    pub fn invalidate_by_key(&mut self, logical_key: &str) {
        if let Binding::Bound { store, .. } = &mut self.binding {
            store.invalidate(logical_key, None);
        }
    }

    /// Presence check that ignores TTL. For inspection only.
    pub fn has_cached(&self, logical_key: &str) -> bool {
        match &self.binding {
            Binding::Bound { store, .. } => store.has(logical_key, None),
            Binding::Unbound => false,
        }
    }

    // == Gift Suggestions ==
    pub fn get_gifts<T: DeserializeOwned>(&mut self, identifier: &str) -> Option<T> {
        self.get_by_key(&gift_key(identifier))
    }

    pub fn set_gifts<T: Serialize>(&mut self, identifier: &str, gifts: &T) {
        self.set_by_key(&gift_key(identifier), gifts, CacheOptions::default().ttl(GIFT_TTL));
    }

    // == Bulk Operations ==
    /// Clears the active region's entries. Returns the number removed.
    pub fn clear_region_cache(&mut self) -> usize {
        match &mut self.binding {
            Binding::Bound { store, .. } => store.clear_region(),
            Binding::Unbound => 0,
        }
    }

    /// Clears cache entries of every region and version.
    pub fn clear_all(&mut self) -> usize {
        clear_all_entries(self.storage.as_ref())
    }

    /// Drops expired entries of every region.
    pub fn clear_expired(&self) -> usize {
        clear_expired(self.storage.as_ref(), self.clock.as_ref())
    }

    // == Stats ==
    pub fn get_cache_stats(&self) -> Option<CacheStats> {
        match &self.binding {
            Binding::Bound { store, .. } => Some(store.get_stats()),
            Binding::Unbound => None,
        }
    }
}
