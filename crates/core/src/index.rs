//! Flat vector index: parallel id / float-vector / packed-bit arrays.
//!
//! Positions correspond 1:1 across the three arrays: `ids[p]` owns the
//! L2-normalized `fvecs[p]` and its sign-bit packing `bvecs[p]`. Entries
//! are appended at load and insert time and never removed or updated; the
//! index lives for the process lifetime. Thread safety is the kernel's
//! job; it holds the index behind a `parking_lot::RwLock`.

use crate::config::INDEX_INITIAL_CAPACITY;
use crate::error::{CoreError, Result};
use crate::histogram::{Histogram, HistogramSummary};
use crate::item::Item;
use crate::quantization::binary::{pack, words_for};
use crate::scan::{top_k_cosine, top_k_hamming};
use crate::vector::l2_normalize_in_place;

/// In-memory flat index over a fixed dimensionality.
#[derive(Debug)]
pub struct VectorIndex {
    dims: usize,
    ids: Vec<i32>,
    fvecs: Vec<Vec<f32>>,
    bvecs: Vec<Vec<u64>>,
    /// Set bits per packed vector, recorded as `popcount + 1` at insert.
    density: Histogram,
}

impl VectorIndex {
    /// Creates an empty index for `dims`-dimensional vectors.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            ids: Vec::with_capacity(INDEX_INITIAL_CAPACITY),
            fvecs: Vec::with_capacity(INDEX_INITIAL_CAPACITY),
            bvecs: Vec::with_capacity(INDEX_INITIAL_CAPACITY),
            density: Histogram::new((64 * words_for(dims) + 1) as u64),
        }
    }

    /// Dimensionality every entry and query must match.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append an entry.
    ///
    /// The embedding is packed from its raw signs, then a normalized copy
    /// is stored; the caller's buffer is never mutated. Rejects wrong
    /// dimensionality and the zero vector.
    pub fn add(&mut self, id: i32, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dims {
            return Err(CoreError::InvalidArgument(format!(
                "expected embedding dimension {}, got {}",
                self.dims,
                embedding.len()
            )));
        }
        if embedding.iter().all(|&x| x == 0.0) {
            return Err(CoreError::InvalidArgument(
                "cannot index the zero vector".into(),
            ));
        }

        // Sign bits are scale-invariant, so packing before normalization
        // yields the same words as packing after.
        let packed = pack(embedding);
        let set_bits: u32 = packed.iter().map(|w| w.count_ones()).sum();
        self.density.record(u64::from(set_bits) + 1);

        let mut normalized = embedding.to_vec();
        l2_normalize_in_place(&mut normalized);

        self.ids.push(id);
        self.fvecs.push(normalized);
        self.bvecs.push(packed);
        Ok(())
    }

    /// Exact top-`k` by cosine distance over the full-precision array.
    ///
    /// The query is normalized on a local copy; returns `(id, distance)`
    /// in ascending distance order.
    pub fn find_closest(&self, query: &[f32], k: usize) -> Result<Vec<(i32, f32)>> {
        self.check_query_dims(query.len())?;
        let mut normalized = query.to_vec();
        l2_normalize_in_place(&mut normalized);

        Ok(top_k_cosine(&normalized, &self.fvecs, k)
            .into_iter()
            .map(|(position, distance)| (self.ids[position], distance))
            .collect())
    }

    /// Approximate top-`k` by Hamming distance over the packed array.
    ///
    /// The query is packed raw; no normalization needed, since sign
    /// packing is scale-invariant. Returns `(id, distance)` in ascending
    /// distance order.
    pub fn find_closest_binary(&self, query: &[f32], k: usize) -> Result<Vec<(i32, u32)>> {
        self.check_query_dims(query.len())?;
        let packed = pack(query);

        Ok(top_k_hamming(&packed, &self.bvecs, k)
            .into_iter()
            .map(|(position, distance)| (self.ids[position], distance))
            .collect())
    }

    /// Clear all three arrays and re-add every item.
    pub fn reindex(&mut self, items: &[Item]) -> Result<()> {
        self.ids.clear();
        self.fvecs.clear();
        self.bvecs.clear();
        self.density = Histogram::new((64 * words_for(self.dims) + 1) as u64);
        for item in items {
            self.add(item.id, &item.embedding)?;
        }
        Ok(())
    }

    /// Digest of the bit-density histogram (mean / percentiles of
    /// `popcount + 1` per entry).
    pub fn density_summary(&self) -> HistogramSummary {
        self.density.summary()
    }

    /// Tenth percentile of the density histogram, for load-time logging.
    pub fn density_percentile(&self, pct: f64) -> u64 {
        self.density.percentile(pct)
    }

    /// Validate internal invariants: parallel array lengths and packed
    /// word counts.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.fvecs.len() != self.ids.len() {
            return Err(format!(
                "fvecs length {} != ids length {}",
                self.fvecs.len(),
                self.ids.len()
            ));
        }
        if self.bvecs.len() != self.ids.len() {
            return Err(format!(
                "bvecs length {} != ids length {}",
                self.bvecs.len(),
                self.ids.len()
            ));
        }
        let expected_words = words_for(self.dims);
        for (p, words) in self.bvecs.iter().enumerate() {
            if words.len() != expected_words {
                return Err(format!(
                    "bvecs[{p}] has {} words, expected {expected_words}",
                    words.len()
                ));
            }
        }
        for (p, fvec) in self.fvecs.iter().enumerate() {
            if fvec.len() != self.dims {
                return Err(format!(
                    "fvecs[{p}] has {} dims, expected {}",
                    fvec.len(),
                    self.dims
                ));
            }
        }
        Ok(())
    }

    fn check_query_dims(&self, got: usize) -> Result<()> {
        if got != self.dims {
            return Err(CoreError::InvalidArgument(format!(
                "expected query dimension {}, got {got}",
                self.dims
            )));
        }
        Ok(())
    }
}
