//! Namespaced Key Module
//!
//! Storage keys have the shape `{version}_{REGION}_{logicalKey}`, e.g.
//! `v1_BR_tech_newest_en-US`. The version and region prefix is the only
//! isolation between regions sharing one storage.
//!
//! The version is any non-empty tag; the region is the first `_XX_`
//! segment after it.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::region::RegionCode;

static CACHE_KEY_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)_([A-Z]{2})_(.*)$").expect("cache key pattern is valid")
});

// == Namespaced Key ==
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedKey {
    pub version: String,
    pub region: RegionCode,
    pub logical: String,
}

impl NamespacedKey {
    pub fn new(version: impl Into<String>, region: RegionCode, logical: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            region,
            logical: logical.into(),
        }
    }

    /// Parses a raw storage key. Returns `None` for keys that are not cache
    /// entries (preferences, geolocation cache, foreign data).
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = CACHE_KEY_SHAPE.captures(raw)?;
        let region = RegionCode::parse(&caps[2]).ok()?;
        Some(Self::new(&caps[1], region, &caps[3]))
    }
}

impl fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.version, self.region, self.logical)
    }
}

/// True if `raw` has the namespaced cache-key shape, in any region or version.
pub fn is_cache_key(raw: &str) -> bool {
    CACHE_KEY_SHAPE.is_match(raw)
}

/// True if `raw` is a cache key whose region segment is `region`.
pub fn is_region_key(raw: &str, region: &RegionCode) -> bool {
    CACHE_KEY_SHAPE
        .captures(raw)
        .is_some_and(|caps| &caps[2] == region.as_str())
}
