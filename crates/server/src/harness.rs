//! Offline latency harness.
//!
//! Replays a prepared query file through the full-precision path, the
//! two-stage path, and the raw binary path, then prints the kernel's
//! per-stage latency histograms and a binary-vs-full top-K match-count
//! histogram. Recall here is reported, not asserted; it is an operator
//! signal for tuning `overshoot`.

use crate::queryfile::QueryRecord;
use signet_core::error::Result;
use signet_core::Kernel;

/// Replay `records` and print the report to stdout.
pub fn run(kernel: &Kernel, records: &[QueryRecord], k: usize, overshoot: usize) -> Result<()> {
    if records.is_empty() {
        println!("query file is empty, nothing to replay");
        return Ok(());
    }

    let mut match_histogram = vec![0usize; k + 1];
    for record in records {
        let exact = kernel.search_full_ids(&record.embedding, k)?;
        let two_stage = kernel.search_binary_ids(&record.embedding, k, true, overshoot)?;
        // Raw binary order, to populate its latency column.
        kernel.search_binary_ids(&record.embedding, k, false, 0)?;

        let matches = two_stage.iter().filter(|id| exact.contains(id)).count();
        match_histogram[matches.min(k)] += 1;
    }

    let snapshot = kernel.stats_snapshot();
    println!(
        "replayed {} queries over {} items (k={k}, overshoot={overshoot})",
        records.len(),
        kernel.len()
    );
    println!();
    println!(
        "{:<12} {:>8} {:>12} {:>10} {:>10} {:>10}",
        "stage", "count", "mean_us", "p50_us", "p90_us", "p99_us"
    );
    for (name, s) in [
        ("full_scan", &snapshot.full_scan),
        ("binary_scan", &snapshot.binary_scan),
        ("store_read", &snapshot.store_read),
        ("rerank", &snapshot.rerank),
        ("embed", &snapshot.embed),
    ] {
        println!(
            "{:<12} {:>8} {:>12.1} {:>10} {:>10} {:>10}",
            name, s.count, s.mean, s.p50, s.p90, s.p99
        );
    }

    println!();
    println!("binary-vs-full top-{k} match histogram:");
    for (matches, count) in match_histogram.iter().enumerate() {
        if *count > 0 {
            println!("  {matches:>3} of {k}: {count}");
        }
    }
    let total_matches: usize = match_histogram
        .iter()
        .enumerate()
        .map(|(matches, count)| matches * count)
        .sum();
    let recall = total_matches as f64 / (records.len() * k) as f64;
    println!("mean recall@{k}: {recall:.3}");

    Ok(())
}
