//! Persisted item record and its byte codec.
//!
//! An [`Item`] is the unit of storage: a caller-assigned integer id, the
//! semantic key text it was embedded from, an opaque payload, and the
//! embedding itself. Records round-trip through bincode (length-prefixed
//! strings and arrays, little-endian scalars); the embedding survives the
//! round trip bit-exact.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// A stored record: id, semantic key, payload, and embedding.
///
/// `embedding` may be empty on input; the kernel fills it via the
/// embedder before persisting. Once persisted, the embedding is the
/// L2-normalized vector the index holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Caller-assigned id. Monotonically increasing, unique.
    pub id: i32,
    /// Text the embedding was computed from.
    pub semantic_key: String,
    /// Opaque payload returned by searches.
    pub payload: String,
    /// Embedding vector; empty until the kernel fills it.
    pub embedding: Vec<f32>,
}

impl Item {
    /// Creates an item with no embedding yet.
    pub fn new(id: i32, semantic_key: String, payload: String) -> Self {
        Self {
            id,
            semantic_key,
            payload,
            embedding: Vec::new(),
        }
    }
}

/// Serialize an item to its persisted byte form.
pub fn encode_item(item: &Item) -> Result<Vec<u8>> {
    bincode::serialize(item).map_err(|e| CoreError::Internal(e.to_string()))
}

/// Decode an item from persisted bytes.
///
/// Failure maps to [`CoreError::CorruptRecord`]: fatal to the operation,
/// never to the process.
pub fn decode_item(bytes: &[u8]) -> Result<Item> {
    bincode::deserialize(bytes).map_err(|e| CoreError::CorruptRecord(e.to_string()))
}
