//! Region Resolver
//!
//! Picks the active region synchronously from what is already known: the
//! request URL, stored preferences and the geolocation cache. Network-based
//! refinement happens elsewhere and feeds back through preference writes.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{
    cached_country, is_region_active, load_region_preference, region_by_locale, region_config,
    RegionConfig,
};
use crate::cache::Clock;
use crate::storage::Storage;

static LOCALE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^/(pt-br|en-us|es-es|en-gb|de-de)(/|$)").expect("locale path pattern is valid")
});

// == Region Resolver ==
/// Detects the region that should scope the cache right now.
pub trait RegionResolver: Send + Sync {
    /// Must return immediately; no network I/O.
    fn detect(&self) -> RegionConfig;
}

// == Detection Context ==
/// URL parts available at detection time.
#[derive(Debug, Clone, Default)]
pub struct DetectionContext {
    /// Value of the `region` query parameter
    pub query_region: Option<String>,
    /// URL path, e.g. `/pt-br/gifts`
    pub path: Option<String>,
    /// Host name, e.g. `br.suggestiss.com`
    pub host: Option<String>,
}

// == Preference Resolver ==
/// Detection in priority order: query parameter, locale path prefix, stored
/// preference, host name, cached geolocation, then the fallback region.
pub struct PreferenceResolver {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    context: DetectionContext,
    fallback: RegionConfig,
}

impl PreferenceResolver {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, fallback: RegionConfig) -> Self {
        Self {
            storage,
            clock,
            context: DetectionContext::default(),
            fallback,
        }
    }

    pub fn with_context(mut self, context: DetectionContext) -> Self {
        self.context = context;
        self
    }

    fn from_query(&self) -> Option<RegionConfig> {
        let code = self.context.query_region.as_deref()?;
        region_config(code).copied()
    }

    fn from_path(&self) -> Option<RegionConfig> {
        let path = self.context.path.as_deref()?;
        let caps = LOCALE_PATH.captures(path)?;
        region_by_locale(&caps[1])
            .filter(|r| r.active)
            .copied()
    }

    fn from_preference(&self) -> Option<RegionConfig> {
        let code = load_region_preference(self.storage.as_ref())?;
        region_config(code.as_str()).filter(|r| r.active).copied()
    }

    fn from_host(&self) -> Option<RegionConfig> {
        let host = self.context.host.as_deref()?.to_ascii_lowercase();

        if host.contains(".com.br") {
            return region_config("BR").copied();
        }

        let mut parts = host.split('.');
        if let (Some(subdomain), Some(_)) = (parts.next(), parts.next()) {
            if is_region_active(subdomain) {
                return region_config(subdomain).copied();
            }
        }

        if host.contains("suggestiss.com") {
            return region_config("US").copied();
        }
        None
    }

    fn from_geolocation(&self) -> Option<RegionConfig> {
        let code = cached_country(self.storage.as_ref(), self.clock.as_ref())?;
        region_config(code.as_str()).filter(|r| r.active).copied()
    }
}

impl RegionResolver for PreferenceResolver {
    fn detect(&self) -> RegionConfig {
        let sources: [(&str, fn(&Self) -> Option<RegionConfig>); 5] = [
            ("query param", Self::from_query),
            ("pathname", Self::from_path),
            ("stored preference", Self::from_preference),
            ("hostname", Self::from_host),
            ("geolocation cache", Self::from_geolocation),
        ];

        for (source, detect) in sources {
            if let Some(region) = detect(self) {
                debug!("Region {} detected from {}", region.code, source);
                return region;
            }
        }

        debug!("Region detection fell back to {}", self.fallback.code);
        self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::region::{
        save_region_preference, store_country, RegionCode, BRAZIL, GERMANY, UNITED_STATES,
    };
    use crate::storage::MemoryStorage;

    fn resolver(storage: Arc<MemoryStorage>, context: DetectionContext) -> PreferenceResolver {
        PreferenceResolver::new(storage, Arc::new(ManualClock::new(0)), UNITED_STATES)
            .with_context(context)
    }

    fn code(raw: &str) -> RegionCode {
        RegionCode::parse(raw).unwrap()
    }

    #[test]
    fn test_fallback_when_nothing_known() {
        let storage = Arc::new(MemoryStorage::new());
        assert_eq!(resolver(storage, DetectionContext::default()).detect(), UNITED_STATES);
    }

    #[test]
    fn test_query_param_wins_even_for_planned_region() {
        let storage = Arc::new(MemoryStorage::new());
        save_region_preference(storage.as_ref(), &code("BR"));

        let context = DetectionContext {
            query_region: Some("de".to_string()),
            path: Some("/pt-br".to_string()),
            ..Default::default()
        };
        assert_eq!(resolver(storage, context).detect(), GERMANY);
    }

    #[test]
    fn test_path_beats_preference() {
        let storage = Arc::new(MemoryStorage::new());
        save_region_preference(storage.as_ref(), &code("US"));

        let context = DetectionContext {
            path: Some("/PT-BR/gifts".to_string()),
            ..Default::default()
        };
        assert_eq!(resolver(storage, context).detect(), BRAZIL);
    }

    #[test]
    fn test_inactive_path_region_skipped() {
        let storage = Arc::new(MemoryStorage::new());
        let context = DetectionContext {
            path: Some("/de-de".to_string()),
            ..Default::default()
        };
        assert_eq!(resolver(storage, context).detect(), UNITED_STATES);
    }

    #[test]
    fn test_preference_beats_host() {
        let storage = Arc::new(MemoryStorage::new());
        save_region_preference(storage.as_ref(), &code("US"));

        let context = DetectionContext {
            host: Some("suggestiss.com.br".to_string()),
            ..Default::default()
        };
        assert_eq!(resolver(storage, context).detect(), UNITED_STATES);
    }

    #[test]
    fn test_host_rules() {
        let cases = [
            ("suggestiss.com.br", BRAZIL),
            ("br.suggestiss.com", BRAZIL),
            ("us.suggestiss.com", UNITED_STATES),
            ("suggestiss.com", UNITED_STATES),
        ];
        for (host, expected) in cases {
            let context = DetectionContext {
                host: Some(host.to_string()),
                ..Default::default()
            };
            let storage = Arc::new(MemoryStorage::new());
            assert_eq!(resolver(storage, context).detect(), expected, "host {}", host);
        }
    }

    #[test]
    fn test_geolocation_used_before_fallback() {
        let storage = Arc::new(MemoryStorage::new());
        store_country(storage.as_ref(), &ManualClock::new(0), &code("BR"));

        assert_eq!(resolver(storage, DetectionContext::default()).detect(), BRAZIL);
    }
}
