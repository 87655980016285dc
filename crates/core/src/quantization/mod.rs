//! Sign-bit quantization and distance kernels.
//!
//! [`binary`] packs f32 vectors into u64 words by sign bit and computes
//! popcount Hamming distance between packings. [`simd`] holds the
//! full-precision dot-product kernel with NEON / AVX2 dispatch used by the
//! cosine scanner and the normalizer.

pub mod binary;
pub mod simd;

pub use binary::{hamming_distance, pack, pack_into, words_for};
