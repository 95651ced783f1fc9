//! Region Cache - a region-namespaced result cache with TTL expiry
//!
//! Caches recommendation results per market region on top of a pluggable
//! key-value storage, and serves them over a small REST API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod facade;
pub mod loader;
pub mod models;
pub mod region;
pub mod request;
pub mod storage;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use api::AppState;
pub use config::Config;
pub use facade::RegionCacheFacade;
pub use request::RecommendationRequest;
pub use tasks::spawn_sweep_task;
