//! Hybrid query planning: concurrent vector and graph sub-queries under one
//! deadline, then fusion.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use gridrag_core::{
    Embedder, FusionWeights, GraphStore, RagError, Result, SearchConfig, SearchFilters,
    SearchResponse, VectorStore,
};

use crate::assemble;
use crate::fusion;

/// Per-call overrides for a search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Result count; config default when `None`.
    pub top_k: Option<u32>,

    /// Fusion weights; config default when `None`.
    pub weights: Option<FusionWeights>,

    /// Candidate narrowing.
    pub filters: SearchFilters,

    /// Deadline shared by both sub-queries; config default when `None`.
    pub deadline: Option<Duration>,
}

/// Hybrid search planner.
///
/// Runs a vector similarity query and a graph expansion query concurrently
/// and merges their candidates. One failed or timed-out source degrades the
/// response to single-source ranking; losing both fails the call.
pub struct QueryPlanner<V, G, E> {
    vector: Arc<V>,
    graph: Arc<G>,
    embedder: Arc<E>,
    config: SearchConfig,
}

impl<V, G, E> QueryPlanner<V, G, E>
where
    V: VectorStore,
    G: GraphStore,
    E: Embedder,
{
    /// Create a planner over explicit store and embedder handles.
    pub fn new(vector: Arc<V>, graph: Arc<G>, embedder: Arc<E>, config: SearchConfig) -> Self {
        Self {
            vector,
            graph,
            embedder,
            config,
        }
    }

    /// Execute a hybrid search against one collection.
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        let start = Instant::now();

        let top_k = options.top_k.unwrap_or(self.config.default_top_k);
        if top_k == 0 {
            return Err(RagError::invalid_argument("top_k must be positive"));
        }
        let top_k = top_k.min(self.config.max_top_k);

        let weights = options.weights.unwrap_or(self.config.weights);
        weights.validate()?;

        let deadline = options
            .deadline
            .unwrap_or(Duration::from_millis(self.config.deadline_ms));

        info!(collection, top_k, "searching for: {:?}", query);

        let query_embedding = self.embedder.embed_query(query).await?;

        // Fetch more than requested so fusion has something to reorder.
        let fetch_k = (top_k * 2).max(20);

        debug!(collection, "vector and graph sub-queries launched");
        let (vector_result, graph_result) = tokio::join!(
            timeout(
                deadline,
                self.vector.similarity_search(
                    collection,
                    &query_embedding,
                    fetch_k,
                    &options.filters
                )
            ),
            timeout(
                deadline,
                self.graph_branch(collection, &query_embedding, &options.filters)
            ),
        );

        let vector_hits = unwrap_branch("vector", vector_result);
        let graph_hits = unwrap_branch("graph", graph_result);

        let (vector_hits, graph_hits, degraded) = match (vector_hits, graph_hits) {
            (Ok(v), Ok(g)) => (Some(v), Some(g), false),
            (Ok(v), Err(e)) => {
                warn!("graph sub-query failed, degrading to vector-only: {}", e);
                (Some(v), None, true)
            }
            (Err(e), Ok(g)) => {
                warn!("vector sub-query failed, degrading to graph-only: {}", e);
                (None, Some(g), true)
            }
            (Err(vector_err), Err(graph_err)) => {
                return Err(RagError::retrieval_unavailable(format!(
                    "vector: {}; graph: {}",
                    vector_err, graph_err
                )));
            }
        };

        let candidates = fusion::merge_candidates(vector_hits, graph_hits);
        debug!(candidates = candidates.len(), "fusing");
        let fused = fusion::fuse(candidates, &weights);

        let results =
            assemble::attach_payloads(self.vector.as_ref(), collection, fused, top_k).await?;

        let latency_ms = start.elapsed().as_millis() as u64;
        info!(
            latency_ms,
            degraded,
            results = results.len(),
            "search completed"
        );

        Ok(SearchResponse {
            query: query.to_string(),
            degraded,
            latency_ms,
            results,
        })
    }

    /// Graph expansion seeded by its own small vector query, so both
    /// branches run truly in parallel.
    async fn graph_branch(
        &self,
        collection: &str,
        query_embedding: &[f32],
        filters: &SearchFilters,
    ) -> Result<Vec<(String, f32)>> {
        let seeds = self
            .vector
            .similarity_search(collection, query_embedding, self.config.seed_k, filters)
            .await?;
        if seeds.is_empty() {
            return Ok(Vec::new());
        }

        let seed_ids: Vec<String> = seeds.into_iter().map(|(id, _)| id).collect();
        self.graph
            .expand(collection, &seed_ids, self.config.expansion_depth)
            .await
    }
}

/// Collapse a timed sub-query result: a timeout counts as that source being
/// unavailable.
fn unwrap_branch<T>(
    source: &'static str,
    result: std::result::Result<Result<T>, tokio::time::error::Elapsed>,
) -> Result<T> {
    match result {
        Ok(inner) => inner,
        Err(_) => Err(RagError::store_unavailable(
            source,
            "deadline elapsed before the sub-query finished",
        )),
    }
}
