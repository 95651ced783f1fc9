//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::region::RegionConfig;

/// Response body for a cache hit (POST /cache/lookup)
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    /// Logical key derived from the request
    pub key: String,
    /// The cached payload
    pub data: serde_json::Value,
}

/// Response body for PUT /cache
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    pub message: String,
    pub key: String,
}

impl StoreResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' cached successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key,
        }
    }
}

/// Response body for bulk clears (DELETE /cache/region, DELETE /cache/all)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Number of entries removed
    pub removed: usize,
}

/// Response body for GET /region and PUT /region
#[derive(Debug, Clone, Serialize)]
pub struct RegionResponse {
    pub bound: bool,
    pub region: Option<RegionConfig>,
}

impl RegionResponse {
    pub fn new(region: Option<RegionConfig>) -> Self {
        Self {
            bound: region.is_some(),
            region,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
