//! Request and response data transfer objects for the REST API.
//!
//! All types derive `Serialize` and/or `Deserialize` for JSON marshalling
//! via Axum.

use serde::{Deserialize, Serialize};
use signet_core::config::DEFAULT_K;
use signet_core::Item;

/// Request body for `POST /search` (text query).
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Bypass the binary stage and scan full precision directly.
    #[serde(default)]
    pub full: bool,
    /// Override the configured re-rank default.
    pub reorder: Option<bool>,
    /// Override the configured overshoot default.
    pub overshoot: Option<usize>,
}

/// Request body for `POST /search/embedding` (embedding query).
#[derive(Debug, Deserialize)]
pub struct EmbeddingSearchRequest {
    pub embedding: Vec<f32>,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub full: bool,
    pub reorder: Option<bool>,
    pub overshoot: Option<usize>,
}

pub fn default_k() -> usize {
    DEFAULT_K
}

/// Response body for both search endpoints: payloads in result order.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<String>,
}

/// A stored item as returned by the lookup endpoints.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: i32,
    pub semantic_key: String,
    pub payload: String,
    pub embedding: Vec<f32>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            semantic_key: item.semantic_key,
            payload: item.payload,
            embedding: item.embedding,
        }
    }
}

/// Request body for `POST /items/batch`.
#[derive(Debug, Deserialize)]
pub struct BatchLookupRequest {
    pub ids: Vec<i32>,
}

/// Response body for `POST /items/batch`.
#[derive(Debug, Serialize)]
pub struct BatchLookupResponse {
    pub items: Vec<ItemResponse>,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub items: usize,
    pub dimensions: usize,
    pub max_id: i32,
}
