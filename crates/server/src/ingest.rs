//! Input-file ingestion.
//!
//! Each non-empty line of the input file is one item:
//! `semantic_key<TAB>payload`. A line without a tab uses the whole line
//! for both fields. Ids continue from the kernel's current `max_id`;
//! embeddings are fetched in batches so one slow network call covers many
//! items.

use signet_core::config::EMBED_BATCH_SIZE;
use signet_core::error::Result;
use signet_core::{CoreError, Item, Kernel};
use std::path::Path;

/// Parse, embed, persist, and index every line of `path`.
/// Returns the number of items ingested.
pub fn ingest_file(kernel: &Kernel, path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(path).map_err(CoreError::from)?;

    let mut next_id = kernel.max_id() + 1;
    let mut batch: Vec<Item> = Vec::with_capacity(EMBED_BATCH_SIZE);
    let mut total = 0usize;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, payload) = match line.split_once('\t') {
            Some((key, payload)) => (key, payload),
            None => (line, line),
        };
        batch.push(Item::new(next_id, key.to_string(), payload.to_string()));
        next_id += 1;

        if batch.len() == EMBED_BATCH_SIZE {
            total += batch.len();
            kernel.save_items(std::mem::take(&mut batch))?;
            tracing::info!(ingested = total, "input file progress");
        }
    }
    if !batch.is_empty() {
        total += batch.len();
        kernel.save_items(batch)?;
    }
    Ok(total)
}
