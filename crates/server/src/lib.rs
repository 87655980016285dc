//! # signet-server
//!
//! HTTP server and CLI for signet.
//!
//! Provides the REST API, the embedding client, and the offline latency
//! harness. Core search logic lives in `signet-core`.

/// REST API layer: Axum router, HTTP handlers, models, metrics.
pub mod api;
/// JSON configuration file loaded at startup.
pub mod config;
/// Blocking HTTP embedding client.
pub mod embedding;
/// Offline latency harness: replay a query file, report histograms.
pub mod harness;
/// Input-file ingestion: parse, batch-embed, persist, index.
pub mod ingest;
/// Length-prefixed query replay file codec.
pub mod queryfile;
