//! Geolocation Cache
//!
//! Country detected by the (external) IP lookup, remembered for a day so
//! region detection can use it without a network call.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::RegionCode;
use crate::cache::Clock;
use crate::storage::Storage;

pub const GEOLOCATION_CACHE_KEY: &str = "geolocation_cache";

/// How long a detected country stays usable.
pub const GEOLOCATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCacheRecord {
    pub country: String,
    /// Detection time (Unix milliseconds)
    pub timestamp: u64,
}

/// Remembers `country` as detected now.
pub fn store_country(storage: &dyn Storage, clock: &dyn Clock, country: &RegionCode) {
    let record = GeoCacheRecord {
        country: country.to_string(),
        timestamp: clock.now_ms(),
    };

    let result = serde_json::to_string(&record)
        .map_err(|e| e.to_string())
        .and_then(|raw| {
            storage
                .write(GEOLOCATION_CACHE_KEY, &raw)
                .map_err(|e| e.to_string())
        });
    if let Err(e) = result {
        warn!("Failed to cache geolocation: {}", e);
    }
}

/// Returns the cached country while it is younger than 24 hours.
///
/// A stale record is removed.
pub fn cached_country(storage: &dyn Storage, clock: &dyn Clock) -> Option<RegionCode> {
    let raw = match storage.read(GEOLOCATION_CACHE_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!("Failed to read geolocation cache: {}", e);
            return None;
        }
    };

    let record: GeoCacheRecord = match serde_json::from_str(&raw) {
        Ok(record) => record,
        Err(e) => {
            warn!("Failed to read geolocation cache: {}", e);
            return None;
        }
    };

    let age = clock.now_ms().saturating_sub(record.timestamp);
    if age < GEOLOCATION_TTL.as_millis() as u64 {
        return RegionCode::parse(&record.country).ok();
    }

    debug!("Geolocation cache expired");
    if let Err(e) = storage.remove(GEOLOCATION_CACHE_KEY) {
        warn!("Failed to drop expired geolocation cache: {}", e);
    }
    None
}
