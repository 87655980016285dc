//! Fixed-range logarithmic-bucket histogram with atomic counts.
//!
//! Values are tracked in the range `[1, max]` at three significant digits:
//! bucket 0 covers `[0, 2048)` at unit resolution, and each subsequent
//! bucket doubles the value range while keeping 1024 sub-buckets, so the
//! relative error of any recorded value stays under 1/1024. Counts are
//! `AtomicU64` with relaxed ordering; concurrent recorders may race, and
//! the occasional lost sample is accepted by the concurrency model.
//!
//! Used for the kernel's per-stage latency samples (microseconds) and the
//! index's bit-density samples (set bits per packed vector, recorded as
//! `popcount + 1` so the minimum trackable value of 1 is never undershot).

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sub-buckets per bucket before the ranges start doubling. 2048 linear
/// slots give better than 10⁻³ relative resolution (three significant
/// digits).
const SUB_BUCKET_COUNT: usize = 2048;
const SUB_BUCKET_HALF_COUNT: usize = SUB_BUCKET_COUNT / 2;
/// log2(SUB_BUCKET_HALF_COUNT).
const SUB_BUCKET_HALF_COUNT_MAGNITUDE: u32 = 10;
const SUB_BUCKET_MASK: u64 = (SUB_BUCKET_COUNT - 1) as u64;

/// Point-in-time digest of a histogram, for logs and the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub max: u64,
}

/// Concurrent fixed-range logarithmic histogram.
#[derive(Debug)]
pub struct Histogram {
    max_value: u64,
    counts: Vec<AtomicU64>,
    total_count: AtomicU64,
    total_sum: AtomicU64,
    max_recorded: AtomicU64,
}

impl Histogram {
    /// Creates a histogram covering `[1, max_value]`. Samples above the
    /// ceiling saturate at it; samples of 0 are clipped to 1.
    pub fn new(max_value: u64) -> Self {
        assert!(max_value >= 1, "histogram range must be non-empty");

        // Smallest bucket count whose last bucket still covers max_value.
        let mut bucket_count = 1usize;
        let mut covered = SUB_BUCKET_COUNT as u64 - 1;
        while covered < max_value {
            covered = (covered << 1) | 1;
            bucket_count += 1;
        }

        let slots = (bucket_count + 1) * SUB_BUCKET_HALF_COUNT;
        let counts = (0..slots).map(|_| AtomicU64::new(0)).collect();

        Self {
            max_value,
            counts,
            total_count: AtomicU64::new(0),
            total_sum: AtomicU64::new(0),
            max_recorded: AtomicU64::new(0),
        }
    }

    /// Record one sample, clamped into the tracked range.
    pub fn record(&self, value: u64) {
        let clamped = value.clamp(1, self.max_value);
        let idx = Self::index_for(clamped);
        self.counts[idx].fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
        self.total_sum.fetch_add(clamped, Ordering::Relaxed);
        self.max_recorded.fetch_max(clamped, Ordering::Relaxed);
    }

    /// Number of recorded samples.
    pub fn count(&self) -> u64 {
        self.total_count.load(Ordering::Relaxed)
    }

    /// Arithmetic mean of recorded samples (0.0 when empty).
    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        self.total_sum.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Value at the given percentile (0.0–100.0), or 0 when empty.
    ///
    /// Returns the highest value equivalent to the matched bucket, capped
    /// at the histogram ceiling, so p100 equals the (clamped) maximum.
    pub fn percentile(&self, pct: f64) -> u64 {
        let total = self.count();
        if total == 0 {
            return 0;
        }
        let target = ((pct / 100.0) * total as f64).ceil().max(1.0) as u64;

        let mut cumulative = 0u64;
        for (idx, slot) in self.counts.iter().enumerate() {
            cumulative += slot.load(Ordering::Relaxed);
            if cumulative >= target {
                return Self::highest_equivalent(idx).min(self.max_value);
            }
        }
        self.max_value
    }

    /// Largest sample seen (0 when empty).
    pub fn max(&self) -> u64 {
        self.max_recorded.load(Ordering::Relaxed)
    }

    /// Snapshot count/mean/percentiles in one pass.
    pub fn summary(&self) -> HistogramSummary {
        HistogramSummary {
            count: self.count(),
            mean: self.mean(),
            p50: self.percentile(50.0),
            p90: self.percentile(90.0),
            p99: self.percentile(99.0),
            max: self.max(),
        }
    }

    /// Slot index for a value in `[1, max_value]`.
    ///
    /// Bucket 0 holds values below `SUB_BUCKET_COUNT` at unit resolution;
    /// bucket `b ≥ 1` holds `[2048·2^(b−1), 2048·2^b)` with 1024 slots.
    #[inline]
    fn index_for(value: u64) -> usize {
        let msb = 63 - (value | SUB_BUCKET_MASK).leading_zeros();
        let bucket_index = (msb - SUB_BUCKET_HALF_COUNT_MAGNITUDE) as usize;
        let sub_bucket_index = (value >> bucket_index) as usize;
        ((bucket_index + 1) << SUB_BUCKET_HALF_COUNT_MAGNITUDE) + sub_bucket_index
            - SUB_BUCKET_HALF_COUNT
    }

    /// Lowest value mapping to `idx`.
    #[inline]
    fn value_at(idx: usize) -> u64 {
        if idx < SUB_BUCKET_COUNT {
            return idx as u64;
        }
        let bucket_index = (idx >> SUB_BUCKET_HALF_COUNT_MAGNITUDE) - 1;
        let sub_bucket_index = (idx & (SUB_BUCKET_HALF_COUNT - 1)) + SUB_BUCKET_HALF_COUNT;
        (sub_bucket_index as u64) << bucket_index
    }

    /// Highest value mapping to the same slot as `value_at(idx)`.
    #[inline]
    fn highest_equivalent(idx: usize) -> u64 {
        if idx < SUB_BUCKET_COUNT {
            return idx as u64;
        }
        let bucket_index = (idx >> SUB_BUCKET_HALF_COUNT_MAGNITUDE) - 1;
        Self::value_at(idx) + (1u64 << bucket_index) - 1
    }
}
