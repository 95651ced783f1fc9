//! API Module
//!
//! HTTP handlers and routing for the region cache REST API.
//!
//! # Endpoints
//! - `GET /health`, `GET /region`, `PUT /region`
//! - `POST /cache/lookup`, `PUT /cache`, `DELETE /cache`
//! - `DELETE /cache/region`, `DELETE /cache/all`
//! - `GET /stats`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
