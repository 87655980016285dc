//! REST API layer built on Axum.
//!
//! Provides HTTP handlers for search, item lookup, health, stats, and
//! Prometheus metrics. Includes middleware for request tracing, per-request
//! metrics, request timeouts, and body size limits.

/// API error types mapped to HTTP status codes.
pub mod errors;
/// HTTP request handlers and application state.
pub mod handlers;
/// Prometheus metrics recording.
pub mod metrics;
/// Request and response data transfer objects.
pub mod models;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use handlers::AppState;
use signet_core::config;
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

async fn track_metrics(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    metrics::record_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}

/// Build the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/search", post(handlers::search_text))
        .route("/search/embedding", post(handlers::search_embedding))
        .route("/items/batch", post(handlers::batch_items))
        .route("/items/:id", get(handlers::get_item))
        .route("/stats", get(handlers::stats))
        .route("/metrics", get(handlers::metrics_export))
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config::REQUEST_TIMEOUT_SECS,
        )))
        .layer(DefaultBodyLimit::max(config::MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}
