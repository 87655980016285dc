//! Global configuration constants for signet.
//!
//! All tuning parameters and input validation limits are defined here.
//! These are compile-time constants; runtime configuration is handled via
//! the server's JSON config file and CLI arguments.

/// Maximum number of results (`k`) per search request at the public boundary.
pub const MAX_K: usize = 100;

/// Default number of results per search request.
pub const DEFAULT_K: usize = 10;

/// Default number of extra binary-stage candidates fetched beyond `k`
/// when full-precision re-ranking is enabled.
///
/// Widens the re-rank pool: higher values recover more of the exact scan's
/// recall at the cost of extra store reads. Typical range: 20–100 for k=10.
pub const DEFAULT_OVERSHOOT: usize = 30;

/// Maximum number of ids per batch lookup request.
pub const MAX_LOOKUP_IDS: usize = 100;

/// Maximum allowed embedding dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Number of texts per embedding request when batch-embedding input files.
pub const EMBED_BATCH_SIZE: usize = 16;

/// Highest latency value trackable by the kernel's stage histograms,
/// in microseconds (60 s). Larger samples saturate at this ceiling.
pub const LATENCY_MAX_MICROS: u64 = 60_000_000;

/// Initial capacity of the index's parallel arrays. Growth is amortized
/// doubling from here.
pub const INDEX_INITIAL_CAPACITY: usize = 4;

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 7878;

/// Default directory for the store log.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum HTTP request body size in bytes (10 MB).
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;
