//! Embedder contract.
//!
//! The core never performs network I/O; embedding is externalized behind
//! this trait. The server crate provides an HTTP-backed implementation;
//! tests use deterministic in-process embedders.

use crate::error::Result;

/// Turns text into a fixed-dimension embedding vector.
///
/// Output dimensionality is fixed for the lifetime of the embedder and
/// reported via [`dimensions`](Embedder::dimensions). Implementations must
/// reject empty input text with [`CoreError::InvalidArgument`](crate::CoreError).
pub trait Embedder: Send + Sync {
    /// Dimensionality of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving order.
    ///
    /// The default implementation embeds one at a time; network-backed
    /// implementations should override with a single batched call.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}
