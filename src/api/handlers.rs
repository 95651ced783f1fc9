//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use axum::{extract::State, Json};
use tracing::{debug, info};

use crate::cache::{CacheStats, Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::facade::RegionCacheFacade;
use crate::models::{
    CacheKeyRequest, CacheStoreRequest, ChangeRegionRequest, ClearResponse, DeleteResponse,
    HealthResponse, LookupResponse, RegionResponse, StoreResponse,
};
use crate::region::{
    is_region_active, region_config, save_region_preference, PreferenceResolver, RegionCode,
    UNITED_STATES,
};
use crate::storage::{FileStorage, MemoryStorage, Storage, StorageError};

/// Application state shared across all handlers.
///
/// Contains the facade wrapped in Arc<RwLock<>> for thread-safe access.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe region cache
    pub cache: Arc<RwLock<RegionCacheFacade>>,
}

impl AppState {
    /// Creates a new AppState around an existing facade.
    pub fn new(facade: RegionCacheFacade) -> Self {
        Self {
            cache: Arc::new(RwLock::new(facade)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the configured storage, then binds the facade to the detected
    /// region. Fails only if the storage file cannot be opened.
    pub fn from_config(config: &Config) -> std::result::Result<Self, StorageError> {
        let storage: Arc<dyn Storage> = match &config.storage_path {
            Some(path) => Arc::new(FileStorage::open(path, Some(config.storage_quota_bytes))?),
            None => Arc::new(MemoryStorage::with_quota(config.storage_quota_bytes)),
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let fallback = region_config(&config.default_region)
            .copied()
            .unwrap_or(UNITED_STATES);
        let mut facade = RegionCacheFacade::new(storage.clone(), clock.clone()).with_defaults(
            Duration::from_millis(config.default_ttl_ms),
            config.cache_version.clone(),
        );
        facade.resolve(&PreferenceResolver::new(storage, clock, fallback));

        Ok(Self::new(facade))
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /region
///
/// Returns the region the cache is bound to, if any.
pub async fn region_handler(State(state): State<AppState>) -> Json<RegionResponse> {
    let cache = state.cache.read().await;
    Json(RegionResponse::new(cache.region().copied()))
}

/// Handler for PUT /region
///
/// Saves the preference and moves the cache to the requested region,
/// clearing the previous region's entries.
pub async fn change_region_handler(
    State(state): State<AppState>,
    Json(req): Json<ChangeRegionRequest>,
) -> Result<Json<RegionResponse>> {
    let code = RegionCode::parse(&req.code)?;
    if !is_region_active(code.as_str()) {
        return Err(CacheError::InvalidRequest(format!(
            "Region {} is not available",
            code
        )));
    }
    let region = region_config(code.as_str())
        .copied()
        .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown region: {}", code)))?;

    let mut cache = state.cache.write().await;
    save_region_preference(cache.storage().as_ref(), &code);
    cache.on_region_change(region);
    info!("Region switched to {}", code);

    Ok(Json(RegionResponse::new(cache.region().copied())))
}

/// Handler for POST /cache/lookup
///
/// Returns the cached payload for the request in the active region.
/// Filtered requests never hit the cache and always report a miss.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheKeyRequest>,
) -> Result<Json<LookupResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    // Write lock: a read may purge an expired entry and updates counters
    let mut cache = state.cache.write().await;
    if !cache.is_bound() {
        return Err(CacheError::Unbound);
    }

    let key = RegionCacheFacade::derive_key(&req.request);
    if req.request.has_active_filters() {
        debug!("Active filters on {}, reporting miss", key);
        return Err(CacheError::NotFound(key));
    }
    let data = cache
        .get_cached::<serde_json::Value>(&req.request)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(LookupResponse { key, data }))
}

/// Handler for PUT /cache
///
/// Stores a payload for the request with optional TTL. Filtered requests
/// are rejected since they are never served from cache.
pub async fn store_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheStoreRequest>,
) -> Result<Json<StoreResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    if req.request.has_active_filters() {
        return Err(CacheError::InvalidRequest(format!(
            "Filtered requests are not cached: {}",
            RegionCacheFacade::derive_key(&req.request)
        )));
    }

    let mut cache = state.cache.write().await;
    if !cache.is_bound() {
        return Err(CacheError::Unbound);
    }

    cache.set_cached(&req.request, &req.data, req.ttl_ms.map(Duration::from_millis));

    Ok(Json(StoreResponse::new(RegionCacheFacade::derive_key(
        &req.request,
    ))))
}

/// Handler for DELETE /cache
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheKeyRequest>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    if !cache.is_bound() {
        return Err(CacheError::Unbound);
    }
    cache.invalidate_cached(&req.request);

    Ok(Json(DeleteResponse::new(RegionCacheFacade::derive_key(
        &req.request,
    ))))
}

/// Handler for DELETE /cache/region
pub async fn clear_region_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let mut cache = state.cache.write().await;
    if !cache.is_bound() {
        return Err(CacheError::Unbound);
    }
    let removed = cache.clear_region_cache();
    Ok(Json(ClearResponse { removed }))
}

/// Handler for DELETE /cache/all
///
/// Clears entries of every region. Works while unbound.
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let mut cache = state.cache.write().await;
    let removed = cache.clear_all();
    Json(ClearResponse { removed })
}

/// Handler for GET /stats
///
/// Returns statistics for the active region.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<CacheStats>> {
    let cache = state.cache.read().await;
    cache.get_cache_stats().map(Json).ok_or(CacheError::Unbound)
}
