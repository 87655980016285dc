//! Prometheus metrics recording.

use metrics::{counter, gauge, histogram};
use signet_core::Kernel;
use std::time::Duration;

/// Records HTTP request metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Updates index-level gauges.
pub fn update_index_metrics(kernel: &Kernel) {
    gauge!("signet_indexed_items").set(kernel.len() as f64);
    gauge!("signet_max_id").set(f64::from(kernel.max_id()));
}
