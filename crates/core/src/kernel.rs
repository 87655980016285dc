//! Kernel: load, insert, and the two-stage search pipeline.
//!
//! The kernel owns the [`VectorIndex`] behind a `parking_lot::RwLock`
//! (write for inserts, read for scans; the structure is append-only, so
//! a reader never observes a half-inserted entry) and talks to two
//! external collaborators: the [`Store`] for durable records and the
//! [`Embedder`] for text queries. Five per-stage latency histograms use
//! atomic counts and are deliberately outside the index lock.

use crate::config::{LATENCY_MAX_MICROS, MAX_K, MAX_LOOKUP_IDS};
use crate::embed::Embedder;
use crate::error::{CoreError, Result};
use crate::histogram::{Histogram, HistogramSummary};
use crate::index::VectorIndex;
use crate::item::{decode_item, encode_item, Item};
use crate::scan::top_k_cosine;
use crate::store::Store;
use crate::vector::l2_normalize_in_place;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Per-stage latency histograms, in microseconds.
#[derive(Debug)]
pub struct SearchStats {
    /// External embedding calls.
    pub embed: Histogram,
    /// Full-precision cosine scans.
    pub full_scan: Histogram,
    /// Binary Hamming scans.
    pub binary_scan: Histogram,
    /// Store read-back of scan hits.
    pub store_read: Histogram,
    /// Full-precision re-rank over fetched candidates.
    pub rerank: Histogram,
}

impl SearchStats {
    fn new() -> Self {
        Self {
            embed: Histogram::new(LATENCY_MAX_MICROS),
            full_scan: Histogram::new(LATENCY_MAX_MICROS),
            binary_scan: Histogram::new(LATENCY_MAX_MICROS),
            store_read: Histogram::new(LATENCY_MAX_MICROS),
            rerank: Histogram::new(LATENCY_MAX_MICROS),
        }
    }
}

/// Point-in-time digest of every stage histogram plus the density stats.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsSnapshot {
    pub embed: HistogramSummary,
    pub full_scan: HistogramSummary,
    pub binary_scan: HistogramSummary,
    pub store_read: HistogramSummary,
    pub rerank: HistogramSummary,
    pub density: HistogramSummary,
}

/// The search kernel.
pub struct Kernel {
    index: RwLock<VectorIndex>,
    store: Arc<dyn Store>,
    embedder: Arc<dyn Embedder>,
    max_id: AtomicI32,
    stats: SearchStats,
}

impl Kernel {
    /// Create a kernel whose dimensionality is fixed by the embedder.
    pub fn new(store: Arc<dyn Store>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let dims = embedder.dimensions();
        if dims == 0 || dims > crate::config::MAX_DIMENSION {
            return Err(CoreError::InvalidArgument(format!(
                "embedder reports unusable dimensionality {dims}"
            )));
        }
        Ok(Self {
            index: RwLock::new(VectorIndex::new(dims)),
            store,
            embedder,
            max_id: AtomicI32::new(0),
            stats: SearchStats::new(),
        })
    }

    /// Dimensionality of indexed and query vectors.
    pub fn dims(&self) -> usize {
        self.index.read().dims()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Highest item id seen across load and insert.
    pub fn max_id(&self) -> i32 {
        self.max_id.load(Ordering::Relaxed)
    }

    /// Stage latency histograms.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Digest of every stage histogram and the index density histogram.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            embed: self.stats.embed.summary(),
            full_scan: self.stats.full_scan.summary(),
            binary_scan: self.stats.binary_scan.summary(),
            store_read: self.stats.store_read.summary(),
            rerank: self.stats.rerank.summary(),
            density: self.index.read().density_summary(),
        }
    }

    /// Rebuild the index from every record the store advertises.
    ///
    /// Corrupt or unreadable records are logged and skipped; a single bad
    /// record never aborts the load. A record whose embedding
    /// dimensionality disagrees with the embedder is fatal: it means the
    /// deployment changed under persisted data.
    pub fn load(&self) -> Result<usize> {
        let dims = self.dims();
        let keys = self.store.keys()?;
        let mut items = Vec::with_capacity(keys.len());

        for key in keys {
            let bytes = match self.store.read(key) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    tracing::warn!(id = key, "store advertised a key it cannot read, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(id = key, "store read failed, skipping: {e}");
                    continue;
                }
            };
            let item = match decode_item(&bytes) {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(id = key, "skipping corrupt record: {e}");
                    continue;
                }
            };
            if item.embedding.len() != dims {
                return Err(CoreError::Internal(format!(
                    "record {} has dimension {}, embedder reports {dims}; refusing to start",
                    item.id,
                    item.embedding.len()
                )));
            }
            if item.embedding.iter().all(|&x| x == 0.0) {
                tracing::warn!(id = key, "skipping zero-embedding record");
                continue;
            }
            items.push(item);
        }

        {
            let mut index = self.index.write();
            index.reindex(&items)?;
        }
        for item in &items {
            self.max_id.fetch_max(item.id, Ordering::Relaxed);
        }

        if !items.is_empty() {
            let index = self.index.read();
            let density = index.density_summary();
            tracing::info!(
                items = items.len(),
                density_mean = density.mean,
                density_p10 = index.density_percentile(10.0),
                density_p90 = density.p90,
                "index loaded"
            );
        }
        Ok(items.len())
    }

    /// Persist and index a single item.
    pub fn save_item(&self, item: Item) -> Result<()> {
        self.save_items(vec![item])
    }

    /// Persist and index a batch of items.
    ///
    /// Items lacking an embedding get one from the embedder in a single
    /// batched call over their semantic keys. Every embedding is
    /// L2-normalized before it is persisted, so the stored vector is the
    /// indexed vector.
    pub fn save_items(&self, mut items: Vec<Item>) -> Result<()> {
        let missing: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.embedding.is_empty())
            .map(|(slot, _)| slot)
            .collect();

        if !missing.is_empty() {
            let texts: Vec<String> = missing
                .iter()
                .map(|&slot| items[slot].semantic_key.clone())
                .collect();
            let start = Instant::now();
            let embeddings = self.embedder.embed_batch(&texts)?;
            self.stats.embed.record(elapsed_micros(start));
            if embeddings.len() != texts.len() {
                return Err(CoreError::Embedder(format!(
                    "asked for {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                )));
            }
            for (slot, embedding) in missing.into_iter().zip(embeddings) {
                items[slot].embedding = embedding;
            }
        }

        let dims = self.dims();
        for item in &items {
            if item.embedding.len() != dims {
                return Err(CoreError::InvalidArgument(format!(
                    "item {} has embedding dimension {}, expected {dims}",
                    item.id,
                    item.embedding.len()
                )));
            }
            if item.embedding.iter().all(|&x| x == 0.0) {
                return Err(CoreError::InvalidArgument(format!(
                    "item {} has a zero embedding",
                    item.id
                )));
            }
        }

        for mut item in items {
            l2_normalize_in_place(&mut item.embedding);
            let bytes = encode_item(&item)?;
            self.store.upsert(item.id, &bytes)?;
            self.index.write().add(item.id, &item.embedding)?;
            self.max_id.fetch_max(item.id, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Full-precision search returning ids.
    pub fn search_full_ids(&self, query: &[f32], k: usize) -> Result<Vec<i32>> {
        self.validate_k(k)?;
        let start = Instant::now();
        let hits = self.index.read().find_closest(query, k)?;
        self.stats.full_scan.record(elapsed_micros(start));
        Ok(hits.into_iter().map(|(id, _)| id).collect())
    }

    /// Full-precision search returning payloads in scan order.
    pub fn search_full(&self, query: &[f32], k: usize) -> Result<Vec<String>> {
        let ids = self.search_full_ids(query, k)?;
        let items = self.read_items(&ids)?;
        Ok(items.into_iter().map(|item| item.payload).collect())
    }

    /// Full-precision search from query text.
    pub fn search_full_text(&self, text: &str, k: usize) -> Result<Vec<String>> {
        let query = self.embed_query(text)?;
        self.search_full(&query, k)
    }

    /// Two-stage search returning payloads.
    ///
    /// The binary stage fetches `k + overshoot` candidates by Hamming
    /// distance; with `reorder` the fetched full-precision embeddings are
    /// re-ranked by exact cosine distance and the first `k` survive.
    /// Without `reorder` the overshoot is forced to zero and the binary
    /// order is returned as-is.
    pub fn search_binary(
        &self,
        query: &[f32],
        k: usize,
        reorder: bool,
        overshoot: usize,
    ) -> Result<Vec<String>> {
        let candidates = self.binary_candidates(query, k, reorder, overshoot)?;
        let items = self.read_items(&candidates)?;
        let selected = if reorder {
            self.rerank(query, items, k)?
        } else {
            items
        };
        Ok(selected.into_iter().map(|item| item.payload).collect())
    }

    /// Two-stage search returning ids. The no-reorder path skips the
    /// store round-trip entirely.
    pub fn search_binary_ids(
        &self,
        query: &[f32],
        k: usize,
        reorder: bool,
        overshoot: usize,
    ) -> Result<Vec<i32>> {
        let candidates = self.binary_candidates(query, k, reorder, overshoot)?;
        if !reorder {
            return Ok(candidates);
        }
        let items = self.read_items(&candidates)?;
        let selected = self.rerank(query, items, k)?;
        Ok(selected.into_iter().map(|item| item.id).collect())
    }

    /// Two-stage search from query text.
    pub fn search_binary_text(
        &self,
        text: &str,
        k: usize,
        reorder: bool,
        overshoot: usize,
    ) -> Result<Vec<String>> {
        let query = self.embed_query(text)?;
        self.search_binary(&query, k, reorder, overshoot)
    }

    /// Fetch a single record. Absent ids are [`CoreError::NotFound`].
    pub fn lookup(&self, id: i32) -> Result<Item> {
        let bytes = self
            .store
            .read(id)?
            .ok_or_else(|| CoreError::NotFound(format!("id {id}")))?;
        decode_item(&bytes)
    }

    /// Fetch up to [`MAX_LOOKUP_IDS`] records; absent ids are skipped.
    pub fn lookup_batch(&self, ids: &[i32]) -> Result<Vec<Item>> {
        if ids.len() > MAX_LOOKUP_IDS {
            return Err(CoreError::InvalidArgument(format!(
                "batch lookup limited to {MAX_LOOKUP_IDS} ids, got {}",
                ids.len()
            )));
        }
        let mut items = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(bytes) = self.store.read(id)? {
                items.push(decode_item(&bytes)?);
            }
        }
        Ok(items)
    }

    /// Embed query text, recording embed latency.
    pub fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(CoreError::InvalidArgument("query text is empty".into()));
        }
        let start = Instant::now();
        let query = self.embedder.embed(text)?;
        self.stats.embed.record(elapsed_micros(start));
        if query.len() != self.dims() {
            return Err(CoreError::Embedder(format!(
                "embedder returned dimension {}, expected {}",
                query.len(),
                self.dims()
            )));
        }
        Ok(query)
    }

    /// Binary-stage scan for `k + overshoot` candidate ids.
    fn binary_candidates(
        &self,
        query: &[f32],
        k: usize,
        reorder: bool,
        overshoot: usize,
    ) -> Result<Vec<i32>> {
        self.validate_k(k)?;
        let overshoot = if reorder { overshoot } else { 0 };
        let start = Instant::now();
        let hits = self.index.read().find_closest_binary(query, k + overshoot)?;
        self.stats.binary_scan.record(elapsed_micros(start));
        Ok(hits.into_iter().map(|(id, _)| id).collect())
    }

    /// Read scan hits back from the store, preserving order.
    fn read_items(&self, ids: &[i32]) -> Result<Vec<Item>> {
        let start = Instant::now();
        let mut items = Vec::with_capacity(ids.len());
        for &id in ids {
            let bytes = self.store.read(id)?.ok_or_else(|| {
                CoreError::Internal(format!("indexed id {id} is missing from the store"))
            })?;
            items.push(decode_item(&bytes)?);
        }
        self.stats.store_read.record(elapsed_micros(start));
        Ok(items)
    }

    /// Exact cosine re-rank of fetched candidates; first `k` survive.
    ///
    /// The stored embeddings were normalized at insert; the query is
    /// normalized here on a local copy, so the scanner's unit-norm
    /// precondition holds on both sides.
    fn rerank(&self, query: &[f32], mut items: Vec<Item>, k: usize) -> Result<Vec<Item>> {
        if items.is_empty() {
            return Ok(items);
        }
        let dims = self.dims();
        for item in &items {
            if item.embedding.len() != dims {
                return Err(CoreError::CorruptRecord(format!(
                    "record {} round-tripped with dimension {}, expected {dims}",
                    item.id,
                    item.embedding.len()
                )));
            }
        }

        let start = Instant::now();
        let mut normalized = query.to_vec();
        l2_normalize_in_place(&mut normalized);

        let embeddings: Vec<Vec<f32>> = items
            .iter_mut()
            .map(|item| std::mem::take(&mut item.embedding))
            .collect();
        let order = top_k_cosine(&normalized, &embeddings, k);

        let mut slots: Vec<Option<Item>> = items.into_iter().map(Some).collect();
        let mut selected = Vec::with_capacity(order.len());
        for (position, _) in order {
            if let Some(item) = slots[position].take() {
                selected.push(item);
            }
        }
        self.stats.rerank.record(elapsed_micros(start));
        Ok(selected)
    }

    fn validate_k(&self, k: usize) -> Result<()> {
        if k == 0 || k > MAX_K {
            return Err(CoreError::InvalidArgument(format!(
                "k must be between 1 and {MAX_K}, got {k}"
            )));
        }
        Ok(())
    }
}

fn elapsed_micros(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}
