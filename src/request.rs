//! Recommendation Request Module
//!
//! The request descriptor a product listing sends to the recommendation API,
//! and the deterministic logical cache key derived from it.

use serde::{Deserialize, Serialize};

// == Public Constants ==
/// Upper price bound meaning "no upper limit".
pub const FULL_PRICE_MAX: f64 = 999_999.0;

// == Recommendation Request ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    /// Niche identifier, e.g. `tech`
    pub niche: String,
    /// Sort mode, e.g. `newest`
    pub sort: String,
    #[serde(default)]
    pub special_filters: Vec<String>,
    #[serde(default)]
    pub min_virality_score: f64,
    #[serde(default)]
    pub min_price: f64,
    #[serde(default = "full_price_max")]
    pub max_price: f64,
    /// Active UI locale, e.g. `en-US`
    pub locale: String,
}

fn full_price_max() -> f64 {
    FULL_PRICE_MAX
}

impl RecommendationRequest {
    /// Creates a request with every filter at its default.
    pub fn new(niche: impl Into<String>, sort: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            niche: niche.into(),
            sort: sort.into(),
            special_filters: Vec::new(),
            min_virality_score: 0.0,
            min_price: 0.0,
            max_price: FULL_PRICE_MAX,
            locale: locale.into(),
        }
    }

    pub fn with_special_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.special_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_virality(mut self, score: f64) -> Self {
        self.min_virality_score = score;
        self
    }

    pub fn with_price_range(mut self, min: f64, max: f64) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// True if the price bounds are narrower than the full range.
    pub fn has_price_filter(&self) -> bool {
        self.min_price > 0.0 || self.max_price < FULL_PRICE_MAX
    }

    /// True if any filter differs from its default. Such requests bypass the
    /// cache.
    pub fn has_active_filters(&self) -> bool {
        self.has_price_filter() || self.min_virality_score > 0.0 || !self.special_filters.is_empty()
    }

    // == Logical Key ==
    /// Derives the logical cache key.
    ///
    /// Shape: `{niche}_{sort}[_{filters...}][_v{virality}][_p{min}-{max}]_{locale}`.
    /// Special filters are sorted and deduplicated first, so their order
    /// never matters. Default filters add no suffix.
    pub fn logical_key(&self) -> String {
        let mut filters: Vec<&str> = self.special_filters.iter().map(String::as_str).collect();
        filters.sort_unstable();
        filters.dedup();

        let mut key = format!("{}_{}", self.niche, self.sort);
        if !filters.is_empty() {
            key.push('_');
            key.push_str(&filters.join("_"));
        }
        if self.min_virality_score > 0.0 {
            key.push_str(&format!("_v{}", self.min_virality_score));
        }
        if self.has_price_filter() {
            key.push_str(&format!("_p{}-{}", self.min_price, self.max_price));
        }
        key.push('_');
        key.push_str(&self.locale);
        key
    }
}

/// Logical key for a gift-consultant suggestion set.
pub fn gift_key(identifier: &str) -> String {
    format!("gift_{}", identifier)
}
