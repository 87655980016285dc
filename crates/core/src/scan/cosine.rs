//! Top-K linear scan by cosine distance over normalized vectors.

use crate::quantization::simd::dot_f32;
use crate::scan::topk::TopK;
use ordered_float::OrderedFloat;

/// Scan `db` for the `min(k, N)` vectors closest to `query` by cosine
/// distance.
///
/// Precondition: `query` and every `db` vector are unit-normalized, so
/// cosine distance reduces to `1 − dot`. Returns `(position, distance)`
/// pairs in ascending distance order, ties broken by ascending position.
/// Edge cases match [`top_k_hamming`](crate::scan::top_k_hamming):
/// `k == 0` is a programming error, empty `db` returns empty, `k > N`
/// returns `N` results.
pub fn top_k_cosine(query: &[f32], db: &[Vec<f32>], k: usize) -> Vec<(usize, f32)> {
    assert!(k > 0, "k must be positive");
    if db.is_empty() {
        return Vec::new();
    }

    let mut topk = TopK::new(k.min(db.len()));
    for (position, vector) in db.iter().enumerate() {
        debug_assert_eq!(vector.len(), query.len(), "dimensionality mismatch");
        let distance = 1.0 - dot_f32(query, vector);
        topk.admit(position, OrderedFloat(distance));
    }

    topk.into_sorted()
        .into_iter()
        .map(|(position, d)| (position, d.into_inner()))
        .collect()
}
