//! Region Module
//!
//! Market identities (BR, US, ...) that scope cached data, plus the
//! collaborators that decide which one is active: stored preferences, the
//! geolocation cache and the resolver that combines them.

mod geo;
mod preferences;
mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

pub use geo::{cached_country, store_country, GeoCacheRecord, GEOLOCATION_CACHE_KEY, GEOLOCATION_TTL};
pub use preferences::{
    clear_region_preference, load_locale, load_region_preference, save_locale,
    save_region_preference, LOCALE_KEY, PREFERRED_REGION_KEY,
};
pub use resolver::{DetectionContext, PreferenceResolver, RegionResolver};

// == Region Code ==
/// Two-letter upper-case region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    /// Parses a region code, accepting any letter case.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CacheError::InvalidRequest(format!(
                "Region code must be two letters, got '{}'",
                raw
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RegionCode {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.0
    }
}

// == Region Config ==
/// Storefront and localization settings for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionConfig {
    pub code: &'static str,
    pub name: &'static str,
    pub amazon_domain: &'static str,
    pub affiliate_tag: &'static str,
    pub currency: &'static str,
    pub locale: &'static str,
    /// Whether the region has a live affiliate tag
    pub active: bool,
}

impl RegionConfig {
    pub fn region_code(&self) -> RegionCode {
        RegionCode(self.code.to_string())
    }
}

// == Region Registry ==
pub const BRAZIL: RegionConfig = RegionConfig {
    code: "BR",
    name: "Brasil",
    amazon_domain: "amazon.com.br",
    affiliate_tag: "suggestissBR-20",
    currency: "BRL",
    locale: "pt-BR",
    active: true,
};

pub const UNITED_STATES: RegionConfig = RegionConfig {
    code: "US",
    name: "United States",
    amazon_domain: "amazon.com",
    affiliate_tag: "suggestissus-20",
    currency: "USD",
    locale: "en-US",
    active: true,
};

pub const SPAIN: RegionConfig = RegionConfig {
    code: "ES",
    name: "España",
    amazon_domain: "amazon.es",
    affiliate_tag: "suggestisses-20",
    currency: "EUR",
    locale: "es-ES",
    active: false,
};

pub const UNITED_KINGDOM: RegionConfig = RegionConfig {
    code: "UK",
    name: "United Kingdom",
    amazon_domain: "amazon.co.uk",
    affiliate_tag: "suggestissuk-20",
    currency: "GBP",
    locale: "en-GB",
    active: false,
};

pub const GERMANY: RegionConfig = RegionConfig {
    code: "DE",
    name: "Deutschland",
    amazon_domain: "amazon.de",
    affiliate_tag: "suggestissde-20",
    currency: "EUR",
    locale: "de-DE",
    active: false,
};

/// Every known region, active or planned.
pub const REGIONS: [RegionConfig; 5] = [BRAZIL, UNITED_STATES, SPAIN, UNITED_KINGDOM, GERMANY];

/// Looks up a region by code, in any letter case.
pub fn region_config(code: &str) -> Option<&'static RegionConfig> {
    REGIONS.iter().find(|r| r.code.eq_ignore_ascii_case(code.trim()))
}

/// Looks up a region by its locale tag (`pt-BR`, `en-us`, ...).
pub fn region_by_locale(locale: &str) -> Option<&'static RegionConfig> {
    REGIONS.iter().find(|r| r.locale.eq_ignore_ascii_case(locale.trim()))
}

/// True if `code` names a region with a live affiliate tag.
pub fn is_region_active(code: &str) -> bool {
    region_config(code).is_some_and(|r| r.active)
}
