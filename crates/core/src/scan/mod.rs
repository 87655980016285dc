//! Linear top-K scanners.
//!
//! Both scanners share the same discipline: one pass over the candidate
//! array, a bounded max-heap of capacity `min(k, N)` keyed on distance,
//! and a final ascending-distance sort with ties broken by ascending
//! candidate position. [`hamming`] scans packed sign bits, [`cosine`]
//! scans full-precision normalized vectors.

pub mod cosine;
pub mod hamming;
pub mod topk;

pub use cosine::top_k_cosine;
pub use hamming::top_k_hamming;
