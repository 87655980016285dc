//! Scanner benchmark: full-precision cosine vs binary Hamming vs two-stage.
//! Measures QPS and Recall@10 of the binary stage against the exact scan
//! over a synthetic unit-vector corpus.
//!
//! Usage: cargo bench --bench scan

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use signet_core::quantization::binary::pack;
use signet_core::scan::{top_k_cosine, top_k_hamming};
use signet_core::vector::l2_normalize_in_place;
use std::time::Instant;

const DIMS: usize = 1536;
const CORPUS: usize = 20_000;
const QUERIES: usize = 200;
const K: usize = 10;
const OVERSHOOT: usize = 30;

fn random_unit_vector(rng: &mut StdRng) -> Vec<f32> {
    let mut v: Vec<f32> = (0..DIMS).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
    l2_normalize_in_place(&mut v);
    v
}

fn main() {
    let mut rng = StdRng::seed_from_u64(42);

    println!("building corpus: {CORPUS} x {DIMS}-dim unit vectors...");
    let fvecs: Vec<Vec<f32>> = (0..CORPUS).map(|_| random_unit_vector(&mut rng)).collect();
    let bvecs: Vec<Vec<u64>> = fvecs.iter().map(|v| pack(v)).collect();
    let queries: Vec<Vec<f32>> = (0..QUERIES).map(|_| random_unit_vector(&mut rng)).collect();

    // Exact scan: ground truth + full-precision QPS.
    let start = Instant::now();
    let exact: Vec<Vec<usize>> = queries
        .iter()
        .map(|q| {
            top_k_cosine(q, &fvecs, K)
                .into_iter()
                .map(|(position, _)| position)
                .collect()
        })
        .collect();
    let full_secs = start.elapsed().as_secs_f64();
    println!(
        "full scan:     {:>8.1} qps ({:.2} ms/query)",
        QUERIES as f64 / full_secs,
        full_secs * 1000.0 / QUERIES as f64
    );

    // Binary scan alone.
    let start = Instant::now();
    for q in &queries {
        let packed = pack(q);
        top_k_hamming(&packed, &bvecs, K);
    }
    let binary_secs = start.elapsed().as_secs_f64();
    println!(
        "binary scan:   {:>8.1} qps ({:.2} ms/query)",
        QUERIES as f64 / binary_secs,
        binary_secs * 1000.0 / QUERIES as f64
    );

    // Two-stage: binary overshoot then exact re-rank of the candidates.
    let start = Instant::now();
    let mut total_matches = 0usize;
    for (q, truth) in queries.iter().zip(&exact) {
        let packed = pack(q);
        let candidates = top_k_hamming(&packed, &bvecs, K + OVERSHOOT);
        let pool: Vec<Vec<f32>> = candidates
            .iter()
            .map(|&(position, _)| fvecs[position].clone())
            .collect();
        let reranked = top_k_cosine(q, &pool, K);
        total_matches += reranked
            .iter()
            .filter(|hit| truth.contains(&candidates[hit.0].0))
            .count();
    }
    let two_stage_secs = start.elapsed().as_secs_f64();
    println!(
        "two-stage:     {:>8.1} qps ({:.2} ms/query), recall@{K} = {:.3}",
        QUERIES as f64 / two_stage_secs,
        two_stage_secs * 1000.0 / QUERIES as f64,
        total_matches as f64 / (QUERIES * K) as f64
    );
}
