//! Stored Preferences
//!
//! Plain-string user choices kept next to the cache in the same storage.
//! Like the cache, these helpers never fail: faults are logged and treated
//! as "no preference".

use tracing::{debug, warn};

use super::{region_config, RegionCode};
use crate::storage::Storage;

/// Storage key of the preferred region code.
pub const PREFERRED_REGION_KEY: &str = "preferredRegion";

/// Storage key of the preferred UI locale tag.
pub const LOCALE_KEY: &str = "locale";

/// Persists the preferred region. Unknown regions are ignored.
///
/// Returns true if the preference was written.
pub fn save_region_preference(storage: &dyn Storage, code: &RegionCode) -> bool {
    if region_config(code.as_str()).is_none() {
        warn!("Ignoring preference for unknown region: {}", code);
        return false;
    }

    match storage.write(PREFERRED_REGION_KEY, code.as_str()) {
        Ok(()) => {
            debug!("Saved region preference: {}", code);
            true
        }
        Err(e) => {
            warn!("Could not save region preference: {}", e);
            false
        }
    }
}

/// Reads the preferred region, if one is stored and parses.
pub fn load_region_preference(storage: &dyn Storage) -> Option<RegionCode> {
    match storage.read(PREFERRED_REGION_KEY) {
        Ok(saved) => saved.and_then(|raw| RegionCode::parse(&raw).ok()),
        Err(e) => {
            warn!("Could not read region preference: {}", e);
            None
        }
    }
}

pub fn clear_region_preference(storage: &dyn Storage) {
    if let Err(e) = storage.remove(PREFERRED_REGION_KEY) {
        warn!("Could not clear region preference: {}", e);
    }
}

/// Persists the preferred UI locale tag.
pub fn save_locale(storage: &dyn Storage, locale: &str) -> bool {
    match storage.write(LOCALE_KEY, locale) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not save locale preference: {}", e);
            false
        }
    }
}

pub fn load_locale(storage: &dyn Storage) -> Option<String> {
    storage
        .read(LOCALE_KEY)
        .map_err(|e| warn!("Could not read locale preference: {}", e))
        .ok()
        .flatten()
        .filter(|locale| !locale.is_empty())
}
