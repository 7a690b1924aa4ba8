//! Core traits defining the interfaces between components.
//!
//! Store clients are explicit objects constructed once and passed by `Arc`
//! into the indexers and the query planner; nothing here is ambient global
//! state.

use async_trait::async_trait;
use std::collections::HashSet;
use ulid::Ulid;

use crate::error::Result;
use crate::types::{Chunk, ChunkStrategy, Relation};

/// Optional narrowing applied to a vector similarity search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Restrict to chunks of one document.
    pub document_id: Option<Ulid>,

    /// Restrict to chunks produced by one strategy.
    pub strategy: Option<ChunkStrategy>,
}

impl SearchFilters {
    /// No narrowing.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Embedding provider. External capability: the engine calls it, it does not
/// implement the model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of chunk texts.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Vector store: per-collection namespace of (chunk id, vector, payload).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert chunks (with embeddings attached) into a collection namespace.
    /// Re-upserting an id overwrites the prior row.
    async fn upsert_chunks(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by id. Ids already absent are not an error.
    async fn delete_chunks(&self, collection: &str, chunk_ids: &[String]) -> Result<()>;

    /// Nearest chunks by cosine similarity, best first.
    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: u32,
        filters: &SearchFilters,
    ) -> Result<Vec<(String, f32)>>;

    /// Which of the given ids exist in the collection. Used for relation
    /// endpoint integrity checks.
    async fn existing_ids(&self, collection: &str, ids: &[String]) -> Result<HashSet<String>>;

    /// Fetch chunk payloads by id. Missing ids are simply omitted.
    async fn fetch_chunks(&self, collection: &str, ids: &[String]) -> Result<Vec<Chunk>>;

    /// All chunk ids belonging to a document, for cascade deletion.
    async fn chunk_ids_for_document(&self, collection: &str, doc_id: Ulid) -> Result<Vec<String>>;

    /// Health probe.
    async fn ping(&self) -> Result<()>;
}

/// Graph store: typed weighted edges between chunks of a collection.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Upsert relations, idempotent by `(source, target, kind)`.
    async fn upsert_relations(&self, collection: &str, relations: &[Relation]) -> Result<()>;

    /// Expand outward from seed chunk ids up to `depth` hops. Returns
    /// discovered chunk ids (seeds excluded) with a relevance score derived
    /// from edge strength and hop distance.
    async fn expand(
        &self,
        collection: &str,
        seeds: &[String],
        depth: u8,
    ) -> Result<Vec<(String, f32)>>;

    /// Delete every relation with either endpoint in `chunk_ids`.
    async fn delete_relations_touching(
        &self,
        collection: &str,
        chunk_ids: &[String],
    ) -> Result<()>;

    /// Health probe.
    async fn ping(&self) -> Result<()>;
}
