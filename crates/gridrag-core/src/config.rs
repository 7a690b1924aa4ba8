//! Configuration types for the retrieval engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{RagError, Result};

/// Main configuration for the retrieval engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Embedding provider configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store configuration.
    #[serde(default)]
    pub vector_store: StoreConfig,

    /// Graph store configuration.
    #[serde(default)]
    pub graph_store: StoreConfig,

    /// Chunking defaults.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Search defaults.
    #[serde(default)]
    pub search: SearchConfig,

    /// Ingestion configuration.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Department name to collection slug aliases. Lets a Korean department
    /// name map to a fixed English slug.
    #[serde(default)]
    pub collection_aliases: HashMap<String, String>,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider base URL (OpenAI-compatible `/embeddings` endpoint).
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// API key; empty means unauthenticated (local providers).
    #[serde(default)]
    pub api_key: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected embedding dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Texts per provider request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,

    /// Bounded retry attempts on provider throttling.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds, doubled per attempt.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            api_key: String::new(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            timeout_ms: default_request_timeout(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base(),
        }
    }
}

/// Backing store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_data_dir().join("store.db"),
        }
    }
}

/// Chunking defaults, overridable per ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Default strategy tag.
    #[serde(default = "default_strategy")]
    pub default_strategy: String,

    /// Rows per chunk for row_based and column_semantic.
    #[serde(default = "default_rows_per_chunk")]
    pub rows_per_chunk: usize,

    /// Window size for sliding_window.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Overlap for sliding_window; must stay below `window`.
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Rows per leaf for hierarchical.
    #[serde(default = "default_leaf_rows")]
    pub leaf_rows: usize,

    /// Cluster count for topic_clustering.
    #[serde(default = "default_clusters")]
    pub clusters: usize,

    /// Iteration cap for topic_clustering.
    #[serde(default = "default_cluster_iterations")]
    pub max_iterations: usize,

    /// Row-count cap for topic_clustering; larger documents fail fast
    /// instead of blocking the ingestion worker.
    #[serde(default = "default_cluster_max_rows")]
    pub cluster_max_rows: usize,

    /// Wall-clock budget for one clustering run, in milliseconds.
    #[serde(default = "default_cluster_budget")]
    pub cluster_budget_ms: u64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            default_strategy: default_strategy(),
            rows_per_chunk: default_rows_per_chunk(),
            window: default_window(),
            overlap: default_overlap(),
            leaf_rows: default_leaf_rows(),
            clusters: default_clusters(),
            max_iterations: default_cluster_iterations(),
            cluster_max_rows: default_cluster_max_rows(),
            cluster_budget_ms: default_cluster_budget(),
        }
    }
}

/// Fusion weights for combining per-source scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Weight of the normalized vector similarity term.
    #[serde(default = "default_vector_weight")]
    pub vector: f32,

    /// Weight of the normalized graph relevance term.
    #[serde(default = "default_graph_weight")]
    pub graph: f32,

    /// Weight of the auxiliary (cross-source corroboration) term.
    #[serde(default = "default_auxiliary_weight")]
    pub auxiliary: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            vector: default_vector_weight(),
            graph: default_graph_weight(),
            auxiliary: default_auxiliary_weight(),
        }
    }
}

impl FusionWeights {
    /// Reject negative weights and all-zero weight sets before any I/O.
    pub fn validate(&self) -> Result<()> {
        if self.vector < 0.0 || self.graph < 0.0 || self.auxiliary < 0.0 {
            return Err(RagError::configuration(
                "fusion weights must be non-negative",
            ));
        }
        if self.vector + self.graph + self.auxiliary <= 0.0 {
            return Err(RagError::configuration(
                "fusion weights must not all be zero",
            ));
        }
        Ok(())
    }
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results.
    #[serde(default = "default_top_k")]
    pub default_top_k: u32,

    /// Maximum number of results a caller may request.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: u32,

    /// Seed hits feeding graph expansion.
    #[serde(default = "default_seed_k")]
    pub seed_k: u32,

    /// Graph expansion depth in hops.
    #[serde(default = "default_expansion_depth")]
    pub expansion_depth: u8,

    /// Per-search deadline in milliseconds, shared by both sub-queries.
    #[serde(default = "default_deadline")]
    pub deadline_ms: u64,

    /// Default fusion weights.
    #[serde(default)]
    pub weights: FusionWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            seed_k: default_seed_k(),
            expansion_depth: default_expansion_depth(),
            deadline_ms: default_deadline(),
            weights: FusionWeights::default(),
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Concurrent documents in flight.
    #[serde(default = "default_ingest_concurrency")]
    pub concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_ingest_concurrency(),
        }
    }
}

// Default value functions

fn default_embedding_endpoint() -> String {
    "http://127.0.0.1:8080/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_batch_size() -> usize {
    32
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    4
}

fn default_backoff_base() -> u64 {
    250
}

fn default_strategy() -> String {
    "row_based".to_string()
}

fn default_rows_per_chunk() -> usize {
    5
}

fn default_window() -> usize {
    6
}

fn default_overlap() -> usize {
    2
}

fn default_leaf_rows() -> usize {
    4
}

fn default_clusters() -> usize {
    4
}

fn default_cluster_iterations() -> usize {
    16
}

fn default_cluster_max_rows() -> usize {
    2000
}

fn default_cluster_budget() -> u64 {
    5_000
}

fn default_vector_weight() -> f32 {
    0.5
}

fn default_graph_weight() -> f32 {
    0.3
}

fn default_auxiliary_weight() -> f32 {
    0.2
}

fn default_top_k() -> u32 {
    10
}

fn default_max_top_k() -> u32 {
    100
}

fn default_seed_k() -> u32 {
    5
}

fn default_expansion_depth() -> u8 {
    2
}

fn default_deadline() -> u64 {
    2_000
}

fn default_ingest_concurrency() -> usize {
    4
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gridrag")
}

impl RagConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| RagError::Configuration {
            message: format!("Failed to parse config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default paths: user config dir, then a local
    /// `gridrag.toml`, then built-in defaults.
    pub fn load_default() -> Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("gridrag").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        let local_config = PathBuf::from("gridrag.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.rows_per_chunk == 0
            || self.chunking.window == 0
            || self.chunking.leaf_rows == 0
            || self.chunking.clusters == 0
        {
            return Err(RagError::configuration(
                "chunking sizes must all be positive",
            ));
        }
        if self.chunking.overlap >= self.chunking.window {
            return Err(RagError::configuration(format!(
                "chunking.overlap ({}) must be smaller than chunking.window ({})",
                self.chunking.overlap, self.chunking.window
            )));
        }
        if self.search.default_top_k == 0 || self.search.max_top_k == 0 {
            return Err(RagError::configuration("top_k defaults must be positive"));
        }
        if self.ingest.concurrency == 0 {
            return Err(RagError::configuration(
                "ingest.concurrency must be positive",
            ));
        }
        self.search.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.default_top_k, 10);
        assert_eq!(config.chunking.rows_per_chunk, 5);
        assert_eq!(config.chunking.window, 6);
        assert_eq!(config.chunking.overlap, 2);
    }

    #[test]
    fn test_default_weights() {
        let w = FusionWeights::default();
        assert_eq!(w.vector, 0.5);
        assert_eq!(w.graph, 0.3);
        assert_eq!(w.auxiliary, 0.2);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let w = FusionWeights {
            vector: -0.1,
            graph: 0.5,
            auxiliary: 0.2,
        };
        assert!(matches!(
            w.validate(),
            Err(RagError::Configuration { .. })
        ));
    }

    #[test]
    fn test_zero_weights_rejected() {
        let w = FusionWeights {
            vector: 0.0,
            graph: 0.0,
            auxiliary: 0.0,
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_overlap_must_stay_below_window() {
        let mut config = RagConfig::default();
        config.chunking.overlap = config.chunking.window;
        assert!(matches!(
            config.validate(),
            Err(RagError::Configuration { .. })
        ));
    }
}
