//! Axum HTTP API server.
//!
//! This crate provides:
//! - Photo upload and site detection endpoints
//! - Liveness and readiness probes
//! - Per-client rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
