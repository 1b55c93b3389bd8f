//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    download_resume, get_all_applications, get_applications_by_job, get_my_applications, health,
    ready, submit_application, update_application_status,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let application_routes = Router::new()
        // Submit a new application with resume upload
        .route("/apply", post(submit_application))
        // Applications submitted by the current applicant
        .route("/me", get(get_my_applications))
        // Applications for a specific job (recruiter/admin)
        .route("/job/:job_id", get(get_applications_by_job))
        // All applications (admin only)
        .route("/all", get(get_all_applications))
        // Status update (recruiter/admin)
        .route("/:application_id/status", patch(update_application_status))
        // Resume download (recruiter/admin)
        .route("/resume/:application_id", get(download_resume));

    // Per-IP rate limiting on the API surface
    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .nest("/api/v1/application", application_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        // axum's default multipart cap is smaller than a 5 MB resume
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
