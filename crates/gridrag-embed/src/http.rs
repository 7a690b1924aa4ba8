//! HTTP embedding provider client.
//!
//! Talks to an OpenAI-compatible `/embeddings` endpoint. The engine treats
//! the model as an external capability: this client batches, authenticates,
//! and retries, nothing more.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use gridrag_core::{Embedder, EmbeddingConfig, RagError, Result};

/// Embedding client for an OpenAI-compatible provider.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimension: usize,
    batch_size: usize,
    max_retries: u32,
    backoff_base: Duration,
}

/// Provider response shape.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Create a client from configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RagError::embedding(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        })
    }

    /// Embed texts, splitting into provider-sized batches.
    async fn embed_batched(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.request_batch(batch).await?);
        }
        Ok(vectors)
    }

    /// One provider round trip with bounded retry on throttling.
    async fn request_batch(&self, batch: &[&str]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.endpoint);
        let body = json!({ "model": self.model, "input": batch });

        let mut attempt = 0u32;
        loop {
            let mut request = self.client.post(&url).json(&body);
            if !self.api_key.is_empty() {
                request = request.header("Authorization", format!("Bearer {}", self.api_key));
            }

            let response = request
                .send()
                .await
                .map_err(|e| RagError::embedding(format!("embedding request failed: {}", e)))?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                attempt += 1;
                if attempt > self.max_retries {
                    return Err(RagError::ProviderRateLimit { attempts: attempt });
                }
                let delay = self.backoff_base * 2u32.saturating_pow(attempt - 1);
                warn!(attempt, ?delay, "embedding provider throttled, backing off");
                tokio::time::sleep(delay).await;
                continue;
            }

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(RagError::embedding(format!(
                    "provider returned {}: {}",
                    status, text
                )));
            }

            let parsed: EmbeddingResponse = response
                .json()
                .await
                .map_err(|e| RagError::embedding(format!("malformed provider response: {}", e)))?;

            debug!(batch = batch.len(), "embedded batch");
            return order_vectors(parsed, batch.len(), self.dimension);
        }
    }
}

/// Restore request order (providers may reorder by index) and validate shape.
fn order_vectors(
    response: EmbeddingResponse,
    expected: usize,
    dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(RagError::embedding(format!(
            "provider returned {} embeddings for {} inputs",
            response.data.len(),
            expected
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for row in response.data {
        if row.index >= expected {
            return Err(RagError::embedding(format!(
                "embedding index {} out of range",
                row.index
            )));
        }
        if row.embedding.len() != dimension {
            return Err(RagError::embedding(format!(
                "expected dimension {}, provider returned {}",
                dimension,
                row.embedding.len()
            )));
        }
        slots[row.index] = Some(row.embedding);
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| RagError::embedding("missing embedding index")))
        .collect()
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embed_batched(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text];
        let results = self.embed_batched(&texts).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("no embedding returned"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
