//! Top-K linear scan by Hamming distance over packed sign bits.

use crate::quantization::binary::hamming_distance;
use crate::scan::topk::TopK;

/// Scan `db` for the `min(k, N)` packings closest to `query` by Hamming
/// distance.
///
/// Returns `(position, distance)` pairs in ascending distance order, ties
/// broken by ascending position. `k == 0` is a programming error; an
/// empty `db` returns empty; every candidate must have the query's word
/// count.
///
/// Complexity `O(N·B + N·log k)` where `B` is the word count; for
/// D=1536, B=24, so the inner body is a handful of XOR+POPCNT
/// instructions per candidate.
pub fn top_k_hamming(query: &[u64], db: &[Vec<u64>], k: usize) -> Vec<(usize, u32)> {
    assert!(k > 0, "k must be positive");
    if db.is_empty() {
        return Vec::new();
    }

    let mut topk = TopK::new(k.min(db.len()));
    for (position, words) in db.iter().enumerate() {
        debug_assert_eq!(words.len(), query.len(), "packed word count mismatch");
        topk.admit(position, hamming_distance(query, words));
    }
    topk.into_sorted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantization::binary::pack;

    #[test]
    fn test_exact_match_first() {
        let db = vec![
            pack(&[1.0, -1.0, 1.0, -1.0]),
            pack(&[1.0, 1.0, 1.0, 1.0]),
            pack(&[-1.0, 1.0, -1.0, 1.0]),
        ];
        let query = pack(&[1.0, -1.0, 1.0, -1.0]);
        let hits = top_k_hamming(&query, &db, 3);
        assert_eq!(hits[0], (0, 0));
        assert_eq!(hits[1], (1, 2));
        assert_eq!(hits[2], (2, 4));
    }

    #[test]
    fn test_empty_db() {
        let query = pack(&[1.0, -1.0]);
        assert!(top_k_hamming(&query, &[], 5).is_empty());
    }

    #[test]
    fn test_k_exceeds_n() {
        let db = vec![pack(&[1.0, 1.0]), pack(&[-1.0, -1.0])];
        let query = pack(&[1.0, 1.0]);
        let hits = top_k_hamming(&query, &db, 10);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_tie_break_ascending_position() {
        let db = vec![
            pack(&[-1.0, 1.0]), // dist 1 from query
            pack(&[1.0, -1.0]), // dist 1
            pack(&[1.0, 1.0]),  // dist 0
        ];
        let query = pack(&[1.0, 1.0]);
        let hits = top_k_hamming(&query, &db, 3);
        assert_eq!(hits, vec![(2, 0), (0, 1), (1, 1)]);
    }

    #[test]
    #[should_panic(expected = "k must be positive")]
    fn test_zero_k_panics() {
        top_k_hamming(&[0u64], &[vec![0u64]], 0);
    }
}
