//! HTTP request handlers and shared application state.
//!
//! The kernel is synchronous (blocking store reads and embedding calls),
//! so every handler hops onto a `spawn_blocking` thread before touching
//! it.

use crate::api::errors::ApiError;
use crate::api::models::*;
use axum::extract::{Path, State};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use signet_core::Kernel;
use std::sync::Arc;
use std::time::Instant;

/// Two-stage search defaults from the config file, overridable per request.
#[derive(Debug, Clone, Copy)]
pub struct SearchDefaults {
    pub reorder: bool,
    pub overshoot: usize,
}

/// Shared application state passed to every handler via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub kernel: Arc<Kernel>,
    pub defaults: SearchDefaults,
    pub prometheus_handle: PrometheusHandle,
    pub start_time: Instant,
}

/// Run a kernel call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, signet_core::CoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {e}")))?
        .map_err(ApiError::from)
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        items: state.kernel.len(),
        dimensions: state.kernel.dims(),
        max_id: state.kernel.max_id(),
    })
}

/// `POST /search`
pub async fn search_text(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if req.query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }
    let kernel = state.kernel.clone();
    let reorder = req.reorder.unwrap_or(state.defaults.reorder);
    let overshoot = req.overshoot.unwrap_or(state.defaults.overshoot);

    let results = blocking(move || {
        if req.full {
            kernel.search_full_text(&req.query, req.k)
        } else {
            kernel.search_binary_text(&req.query, req.k, reorder, overshoot)
        }
    })
    .await?;
    Ok(Json(SearchResponse { results }))
}

/// `POST /search/embedding`
pub async fn search_embedding(
    State(state): State<AppState>,
    Json(req): Json<EmbeddingSearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if req.embedding.is_empty() {
        return Err(ApiError::BadRequest("embedding must not be empty".into()));
    }
    if req.embedding.iter().any(|v| v.is_nan() || v.is_infinite()) {
        return Err(ApiError::BadRequest("embedding contains NaN or Inf".into()));
    }
    let kernel = state.kernel.clone();
    let reorder = req.reorder.unwrap_or(state.defaults.reorder);
    let overshoot = req.overshoot.unwrap_or(state.defaults.overshoot);

    let results = blocking(move || {
        if req.full {
            kernel.search_full(&req.embedding, req.k)
        } else {
            kernel.search_binary(&req.embedding, req.k, reorder, overshoot)
        }
    })
    .await?;
    Ok(Json(SearchResponse { results }))
}

/// `GET /items/{id}`
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ItemResponse>, ApiError> {
    let kernel = state.kernel.clone();
    let item = blocking(move || kernel.lookup(id)).await?;
    Ok(Json(item.into()))
}

/// `POST /items/batch`
pub async fn batch_items(
    State(state): State<AppState>,
    Json(req): Json<BatchLookupRequest>,
) -> Result<Json<BatchLookupResponse>, ApiError> {
    let kernel = state.kernel.clone();
    let items = blocking(move || kernel.lookup_batch(&req.ids)).await?;
    Ok(Json(BatchLookupResponse {
        items: items.into_iter().map(ItemResponse::from).collect(),
    }))
}

/// `GET /stats`
pub async fn stats(State(state): State<AppState>) -> Json<signet_core::kernel::StatsSnapshot> {
    Json(state.kernel.stats_snapshot())
}

/// `GET /metrics`
pub async fn metrics_export(State(state): State<AppState>) -> String {
    crate::api::metrics::update_index_metrics(&state.kernel);
    state.prometheus_handle.render()
}
