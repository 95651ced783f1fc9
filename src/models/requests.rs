//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::request::RecommendationRequest;

/// Request body for switching regions (PUT /region)
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRegionRequest {
    /// Two-letter region code, any case
    pub code: String,
}

/// Request body for lookups and invalidation (POST /cache/lookup, DELETE /cache)
#[derive(Debug, Clone, Deserialize)]
pub struct CacheKeyRequest {
    pub request: RecommendationRequest,
}

impl CacheKeyRequest {
    pub fn validate(&self) -> Option<String> {
        validate_request(&self.request)
    }
}

/// Request body for storing a result (PUT /cache)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStoreRequest {
    pub request: RecommendationRequest,
    /// Payload stored verbatim
    pub data: serde_json::Value,
    /// Optional TTL in milliseconds (uses the default if not specified)
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl CacheStoreRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.ttl_ms == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        validate_request(&self.request)
    }
}

fn validate_request(request: &RecommendationRequest) -> Option<String> {
    if request.niche.is_empty() {
        return Some("Niche cannot be empty".to_string());
    }
    if request.sort.is_empty() {
        return Some("Sort cannot be empty".to_string());
    }
    if request.locale.is_empty() {
        return Some("Locale cannot be empty".to_string());
    }
    if request.min_price > request.max_price {
        return Some("Minimum price exceeds maximum price".to_string());
    }
    None
}
