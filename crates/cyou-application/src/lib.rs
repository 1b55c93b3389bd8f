//! Axum HTTP API for the ConnectYou application service.
//!
//! This crate provides:
//! - The application-submission saga (orchestrated lookups + compensation)
//! - Status updates and resume download with recruiter/admin authorization
//! - Bearer token verification against the shared Auth service secret
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::SubmissionService;
pub use state::AppState;
