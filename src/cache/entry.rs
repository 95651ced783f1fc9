//! Cache Entry Module
//!
//! Defines the stored envelope for a cached payload and its TTL arithmetic.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached payload with the metadata needed to judge its liveness.
///
/// Serialized as `{"data": ..., "storedAt": <epoch ms>, "ttl": <ms>, "version": "v1"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// Caller-defined payload, stored verbatim
    pub data: T,
    /// Write time (Unix milliseconds)
    pub stored_at: u64,
    /// Validity window in milliseconds
    pub ttl: u64,
    /// Schema/format tag the entry was written under
    pub version: String,
}

/// Entry envelope parsed without materializing the payload.
pub type EntryMeta = CacheEntry<IgnoredAny>;

impl<T> CacheEntry<T> {
    // == Constructor ==
    pub fn new(data: T, stored_at: u64, ttl: u64, version: impl Into<String>) -> Self {
        Self {
            data,
            stored_at,
            ttl,
            version: version.into(),
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was written. A clock that moved
    /// backwards yields zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.stored_at)
    }

    // == Is Expired ==
    /// Checks whether the entry is past its TTL at `now_ms`.
    ///
    /// Boundary condition: once the full TTL has elapsed the entry is
    /// expired, so a value written with TTL `T` is readable for every
    /// elapsed time strictly below `T`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.age_ms(now_ms) >= self.ttl
    }

    // == Time To Live ==
    /// Remaining validity in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.ttl.saturating_sub(self.age_ms(now_ms))
    }
}
