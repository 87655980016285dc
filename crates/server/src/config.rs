//! Server configuration loaded from a JSON file at startup.
//!
//! The file names the embedding deployment (endpoint, credentials,
//! deployment identifier) plus local knobs: data directory, port, and the
//! two-stage search defaults.

use serde::Deserialize;
use signet_core::config::{DEFAULT_DATA_DIR, DEFAULT_OVERSHOOT, DEFAULT_PORT};
use std::io;
use std::path::Path;

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the embedding service, e.g. `https://acme.openai.azure.com`.
    pub embedding_endpoint: String,
    /// Credential sent with every embedding request.
    pub api_key: String,
    /// Deployment identifier of the embedding model.
    pub deployment: String,
    /// Embedding API version query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Dimensionality the deployment produces.
    pub dimensions: usize,
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the store log.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Whether searches re-rank binary candidates with full precision.
    #[serde(default = "default_true")]
    pub reorder: bool,
    /// Extra binary candidates fetched beyond `k` when re-ranking.
    #[serde(default = "default_overshoot")]
    pub overshoot: usize,
}

impl ServerConfig {
    /// Load and parse the config file.
    pub fn load(path: &Path) -> io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("config file {path:?} is not valid: {e}"),
            )
        })
    }
}

fn default_api_version() -> String {
    "2023-05-15".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_overshoot() -> usize {
    DEFAULT_OVERSHOOT
}
