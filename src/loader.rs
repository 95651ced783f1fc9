//! Product Loader
//!
//! Fetch-or-populate flow for product listings: consult the cache, fall
//! through to the recommendation API on a miss, and write the result back.
//!
//! The cache lock is held only for the synchronous cache steps, never
//! across the API call. Two concurrent misses for the same key both fetch;
//! the later write wins.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::facade::RegionCacheFacade;
use crate::request::RecommendationRequest;

// == Public Constants ==
/// TTL for cached product listings
pub const PRODUCT_TTL: Duration = Duration::from_secs(10 * 60);

// == Product Record ==
/// One recommended product, stored in the cache verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virality_score: Option<f64>,
    pub affiliate_url: String,
    pub store: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// == API Error ==
/// Failures reported by the recommendation API. These are the only
/// user-visible errors on the listing path; the cache never adds any.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Too many requests; retry after `reset_in` seconds
    #[error("Rate limited: {message} (resets in {reset_in}s)")]
    RateLimited { message: String, reset_in: u64 },

    #[error("Recommendation API error: {0}")]
    Upstream(String),
}

// == Recommendation API ==
/// The backend that produces product recommendations.
pub trait RecommendationApi: Send + Sync {
    fn fetch(
        &self,
        request: &RecommendationRequest,
    ) -> impl Future<Output = Result<Vec<ProductRecord>, ApiError>> + Send;
}

// == Liveness ==
/// Tracks whether the view that started a load still wants its result.
///
/// Clones share the flag. Once cancelled, a load in flight will not write
/// to the cache.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    cancelled: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_current(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}

// == Load Outcome ==
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Served from a live cache entry
    Cached(Vec<ProductRecord>),
    /// Fetched from the API
    Fetched(Vec<ProductRecord>),
    /// The caller went away before the fetch finished
    Cancelled,
}

impl LoadOutcome {
    pub fn products(&self) -> &[ProductRecord] {
        match self {
            LoadOutcome::Cached(products) | LoadOutcome::Fetched(products) => products,
            LoadOutcome::Cancelled => &[],
        }
    }
}

// == Product Loader ==
pub struct ProductLoader<A> {
    api: A,
    ttl: Duration,
}

impl<A: RecommendationApi> ProductLoader<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            ttl: PRODUCT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // == Load ==
    /// Returns products for `request`, from cache when allowed.
    ///
    /// Requests with any non-default filter bypass the cache: their key is
    /// invalidated, nothing is read and nothing is written back. Empty API
    /// results are returned but not cached.
    ///
    /// The region bound when the load starts is pinned. If the facade is
    /// rebound before the fetch returns, the result is dropped as
    /// `Cancelled` so one region's products never land in another's
    /// namespace.
    pub async fn load(
        &self,
        facade: &RwLock<RegionCacheFacade>,
        request: &RecommendationRequest,
        liveness: &Liveness,
    ) -> Result<LoadOutcome, ApiError> {
        let bypass = request.has_active_filters();
        let key = RegionCacheFacade::derive_key(request);

        let pinned_region = {
            let mut cache = facade.write().await;
            if bypass {
                debug!("Active filters on {}, bypassing cache", key);
                cache.invalidate_cached(request);
            } else if let Some(cached) = cache.get_cached::<Vec<ProductRecord>>(request) {
                if !cached.is_empty() {
                    debug!("Using cached products for {}", key);
                    return Ok(LoadOutcome::Cached(cached));
                }
            }
            cache.region().map(|r| r.code)
        };

        let products = match self.api.fetch(request).await {
            Ok(products) => products,
            Err(e) => {
                warn!("Fetching products for {} failed: {}", key, e);
                return Err(e);
            }
        };

        if !liveness.is_current() {
            debug!("Load for {} cancelled, discarding result", key);
            return Ok(LoadOutcome::Cancelled);
        }

        let mut cache = facade.write().await;
        let current_region = cache.region().map(|r| r.code);
        if current_region != pinned_region {
            debug!(
                "Region changed during load for {} ({:?} -> {:?}), discarding result",
                key, pinned_region, current_region
            );
            return Ok(LoadOutcome::Cancelled);
        }

        if products.is_empty() {
            warn!("No products returned for {}", key);
        } else if !bypass {
            cache.set_cached(request, &products, Some(self.ttl));
            info!("Cached {} products for {}", products.len(), key);
        }

        Ok(LoadOutcome::Fetched(products))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::region::{BRAZIL, UNITED_STATES};
    use crate::storage::{MemoryStorage, Storage};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn product(id: &str) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: format!("Product {}", id),
            price: 99.9,
            rating: 4.5,
            ai_reasoning: None,
            virality_score: Some(80.0),
            affiliate_url: format!("https://www.amazon.com.br/dp/{}?tag=suggestissBR-20", id),
            store: "amazon".to_string(),
            currency: "BRL".to_string(),
            asin: Some(id.to_string()),
            image_url: None,
            category: Some("tech".to_string()),
        }
    }

    /// API double that counts calls and can cancel a liveness mid-flight.
    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
        response: Mutex<Option<Result<Vec<ProductRecord>, ApiError>>>,
        cancel_during_fetch: Option<Liveness>,
    }

    impl FakeApi {
        fn returning(products: Vec<ProductRecord>) -> Self {
            Self {
                response: Mutex::new(Some(Ok(products))),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RecommendationApi for FakeApi {
        async fn fetch(
            &self,
            _request: &RecommendationRequest,
        ) -> Result<Vec<ProductRecord>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(liveness) = &self.cancel_during_fetch {
                liveness.cancel();
            }
            self.response
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn bound_facade() -> (RwLock<RegionCacheFacade>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let mut facade = RegionCacheFacade::new(storage.clone(), Arc::new(ManualClock::new(0)));
        facade.on_region_change(BRAZIL);
        (RwLock::new(facade), storage)
    }

    fn tech() -> RecommendationRequest {
        RecommendationRequest::new("tech", "newest", "pt-BR")
    }

    #[tokio::test]
    async fn test_miss_fetches_then_hit_serves_cache() {
        let (facade, _) = bound_facade();
        let loader = ProductLoader::new(FakeApi::returning(vec![product("a"), product("b")]));
        let liveness = Liveness::new();

        let first = loader.load(&facade, &tech(), &liveness).await.unwrap();
        assert!(matches!(first, LoadOutcome::Fetched(_)));

        let second = loader.load(&facade, &tech(), &liveness).await.unwrap();
        assert_eq!(second, LoadOutcome::Cached(vec![product("a"), product("b")]));
        assert_eq!(loader.api().calls(), 1);
    }

    #[tokio::test]
    async fn test_filtered_request_bypasses_cache() {
        let (facade, storage) = bound_facade();
        let loader = ProductLoader::new(FakeApi::returning(vec![product("a")]));
        let filtered = tech().with_special_filters(["deals"]);

        // Stale entry sitting under the filtered key
        facade
            .write()
            .await
            .set_cached(&filtered, &vec![product("stale")], None);

        let outcome = loader.load(&facade, &filtered, &Liveness::new()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Fetched(vec![product("a")]));

        let outcome = loader.load(&facade, &filtered, &Liveness::new()).await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Fetched(_)));
        assert_eq!(loader.api().calls(), 2);

        let key = format!("v1_BR_{}", filtered.logical_key());
        assert!(storage.read(&key).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_load_does_not_write() {
        let (facade, storage) = bound_facade();
        let liveness = Liveness::new();
        let api = FakeApi {
            cancel_during_fetch: Some(liveness.clone()),
            ..FakeApi::returning(vec![product("a")])
        };
        let loader = ProductLoader::new(api);

        let outcome = loader.load(&facade, &tech(), &liveness).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Cancelled);
        assert!(outcome.products().is_empty());
        assert!(storage.is_empty());
    }

    /// API double that moves the facade to another region mid-fetch.
    struct RegionSwitchingApi {
        facade: Arc<RwLock<RegionCacheFacade>>,
        products: Vec<ProductRecord>,
    }

    impl RecommendationApi for RegionSwitchingApi {
        async fn fetch(
            &self,
            _request: &RecommendationRequest,
        ) -> Result<Vec<ProductRecord>, ApiError> {
            self.facade.write().await.on_region_change(UNITED_STATES);
            Ok(self.products.clone())
        }
    }

    #[tokio::test]
    async fn test_region_change_during_fetch_discards_result() {
        let (facade, storage) = bound_facade();
        let facade = Arc::new(facade);
        let loader = ProductLoader::new(RegionSwitchingApi {
            facade: facade.clone(),
            products: vec![product("brl")],
        });

        let outcome = loader.load(&facade, &tech(), &Liveness::new()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Cancelled);

        let us_key = format!("v1_US_{}", tech().logical_key());
        assert!(storage.read(&us_key).unwrap().is_none());
        assert!(storage.is_empty());
        assert_eq!(
            facade.read().await.region().map(|r| r.code),
            Some(UNITED_STATES.code)
        );
    }

    #[tokio::test]
    async fn test_empty_result_not_cached() {
        let (facade, storage) = bound_facade();
        let loader = ProductLoader::new(FakeApi::returning(Vec::new()));

        let outcome = loader.load(&facade, &tech(), &Liveness::new()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Fetched(Vec::new()));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_propagates_and_cache_untouched() {
        let (facade, storage) = bound_facade();
        let api = FakeApi {
            response: Mutex::new(Some(Err(ApiError::RateLimited {
                message: "Too many requests".to_string(),
                reset_in: 60,
            }))),
            ..Default::default()
        };
        let loader = ProductLoader::new(api);

        let err = loader.load(&facade, &tech(), &Liveness::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited { reset_in: 60, .. }));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_unbound_facade_always_fetches() {
        let storage = Arc::new(MemoryStorage::new());
        let facade = RwLock::new(RegionCacheFacade::new(storage.clone(), Arc::new(ManualClock::new(0))));
        let loader = ProductLoader::new(FakeApi::returning(vec![product("a")]));

        loader.load(&facade, &tech(), &Liveness::new()).await.unwrap();
        loader.load(&facade, &tech(), &Liveness::new()).await.unwrap();
        assert_eq!(loader.api().calls(), 2);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_product_record_wire_names() {
        let json = serde_json::to_value(product("B0001")).unwrap();
        assert_eq!(json["affiliateUrl"], "https://www.amazon.com.br/dp/B0001?tag=suggestissBR-20");
        assert_eq!(json["viralityScore"], 80.0);
        assert!(json.get("aiReasoning").is_none());
    }

    #[test]
    fn test_liveness_shared_between_clones() {
        let liveness = Liveness::new();
        let view = liveness.clone();
        assert!(view.is_current());

        liveness.cancel();
        assert!(!view.is_current());
    }

    #[test]
    fn test_load_outside_async_test() {
        let (facade, _) = bound_facade();
        let loader = ProductLoader::new(FakeApi::returning(vec![product("a")]))
            .with_ttl(Duration::from_secs(1));

        let outcome = tokio_test::block_on(loader.load(&facade, &tech(), &Liveness::new()));
        assert_eq!(outcome.unwrap().products().len(), 1);
    }
}
