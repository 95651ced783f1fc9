//! Cache Module
//!
//! Region-namespaced caching with per-entry TTL and versioning, on top of
//! the storage port.

mod clock;
mod entry;
mod key;
mod stats;
mod store;
mod sweep;


use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryMeta};
pub use key::{is_cache_key, is_region_key, NamespacedKey};
pub use stats::{CacheStats, Counters, EntryStats};
pub use store::{CacheOptions, CacheStore};
pub use sweep::{clear_all_entries, clear_expired};

// == Public Constants ==
/// TTL applied when a write does not specify one
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Version tag applied when a call does not specify one
pub const DEFAULT_VERSION: &str = "v1";
