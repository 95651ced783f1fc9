//! API Routes
//!
//! Configures the Axum router with all cache service endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    change_region_handler, clear_all_handler, clear_region_handler, health_handler,
    invalidate_handler, lookup_handler, region_handler, stats_handler, store_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /region` - Active region
/// - `PUT /region` - Switch region
/// - `POST /cache/lookup` - Fetch the cached result for a request
/// - `PUT /cache` - Store a result for a request
/// - `DELETE /cache` - Invalidate the result for a request
/// - `DELETE /cache/region` - Clear the active region
/// - `DELETE /cache/all` - Clear every region
/// - `GET /stats` - Statistics for the active region
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/region", get(region_handler).put(change_region_handler))
        .route("/cache/lookup", post(lookup_handler))
        .route("/cache", put(store_handler).delete(invalidate_handler))
        .route("/cache/region", delete(clear_region_handler))
        .route("/cache/all", delete(clear_all_handler))
        .route("/stats", get(stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::ManualClock;
    use crate::facade::RegionCacheFacade;
    use crate::region::UNITED_STATES;
    use crate::storage::MemoryStorage;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let mut facade = RegionCacheFacade::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::new(1_000_000)),
        );
        facade.on_region_change(UNITED_STATES);
        create_router(AppState::new(facade))
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_store_endpoint() {
        let response = create_test_app()
            .oneshot(json_request(
                "PUT",
                "/cache",
                r#"{"request":{"niche":"tech","sort":"newest","locale":"en-US"},"data":[]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let response = create_test_app()
            .oneshot(json_request(
                "POST",
                "/cache/lookup",
                r#"{"request":{"niche":"tech","sort":"newest","locale":"en-US"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_region_bad_code() {
        let response = create_test_app()
            .oneshot(json_request("PUT", "/region", r#"{"code":"BRA"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
