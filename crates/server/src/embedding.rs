//! Blocking HTTP embedding client.
//!
//! Talks to an OpenAI-compatible deployment endpoint:
//! `POST {endpoint}/openai/deployments/{deployment}/embeddings?api-version=...`
//! with the credential in the `api-key` header. The client is blocking
//! because the core is synchronous; HTTP handlers call it from
//! `spawn_blocking` threads.

use crate::config::ServerConfig;
use serde::{Deserialize, Serialize};
use signet_core::error::{CoreError, Result};
use signet_core::Embedder;
use std::time::Duration;

/// Embedder backed by a remote embedding deployment.
pub struct HttpEmbedder {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(config: &ServerConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        let url = format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            config.embedding_endpoint.trim_end_matches('/'),
            config.deployment,
            config.api_version
        );
        Self {
            client,
            url,
            api_key: config.api_key.clone(),
            dimensions: config.dimensions,
        }
    }

    fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&EmbeddingRequest { input: inputs })
            .send()
            .map_err(|e| CoreError::Embedder(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CoreError::Embedder(format!(
                "embedding service returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| CoreError::Embedder(format!("embedding response malformed: {e}")))?;
        if parsed.data.len() != inputs.len() {
            return Err(CoreError::Embedder(format!(
                "asked for {} embeddings, got {}",
                inputs.len(),
                parsed.data.len()
            )));
        }

        // The service may reorder entries; the index field is authoritative.
        let mut vectors: Vec<Vec<f32>> = vec![Vec::new(); inputs.len()];
        for entry in parsed.data {
            if entry.index >= vectors.len() {
                return Err(CoreError::Embedder(format!(
                    "embedding response index {} out of range",
                    entry.index
                )));
            }
            if entry.embedding.len() != self.dimensions {
                return Err(CoreError::Embedder(format!(
                    "embedding has dimension {}, deployment is configured for {}",
                    entry.embedding.len(),
                    self.dimensions
                )));
            }
            vectors[entry.index] = entry.embedding;
        }
        Ok(vectors)
    }
}

impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(CoreError::InvalidArgument("text to embed is empty".into()));
        }
        let mut vectors = self.request(&[text.to_string()])?;
        Ok(vectors.remove(0))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(empty) = texts.iter().position(|t| t.is_empty()) {
            return Err(CoreError::InvalidArgument(format!(
                "text to embed at position {empty} is empty"
            )));
        }
        self.request(texts)
    }
}
