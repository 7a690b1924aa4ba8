//! Vector and relation indexers: the write path behind chunking.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gridrag_core::{
    Chunk, Embedder, GraphStore, RagError, Relation, Result, VectorStore,
};

/// Embeds chunk text and upserts vectors into a collection namespace.
pub struct VectorIndexer<V, E> {
    store: Arc<V>,
    embedder: Arc<E>,
}

impl<V, E> VectorIndexer<V, E>
where
    V: VectorStore,
    E: Embedder,
{
    pub fn new(store: Arc<V>, embedder: Arc<E>) -> Self {
        Self { store, embedder }
    }

    /// Embed and upsert chunks. Returns the chunks with embeddings attached.
    pub async fn index(&self, collection: &str, mut chunks: Vec<Chunk>) -> Result<Vec<Chunk>> {
        if chunks.is_empty() {
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::internal(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = Some(embedding);
        }

        self.store.upsert_chunks(collection, &chunks).await?;
        debug!(collection, count = chunks.len(), "indexed chunks");
        Ok(chunks)
    }

    /// Remove chunk vectors. Absent ids are not an error.
    pub async fn delete(&self, collection: &str, chunk_ids: &[String]) -> Result<()> {
        self.store.delete_chunks(collection, chunk_ids).await
    }
}

/// A relation refused by the integrity check, with the refusal reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRelation {
    pub relation: Relation,
    pub reason: String,
}

/// Outcome of a relation upsert batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationReport {
    /// Relations written to the graph store.
    pub accepted: usize,

    /// Relations refused individually; never silently dropped.
    pub rejected: Vec<RejectedRelation>,
}

/// Persists relations after checking both endpoints against chunks already
/// indexed in the vector store.
pub struct RelationIndexer<V, G> {
    vector: Arc<V>,
    graph: Arc<G>,
}

impl<V, G> RelationIndexer<V, G>
where
    V: VectorStore,
    G: GraphStore,
{
    pub fn new(vector: Arc<V>, graph: Arc<G>) -> Self {
        Self { vector, graph }
    }

    /// Validate endpoints and upsert the accepted relations.
    pub async fn index(&self, collection: &str, relations: Vec<Relation>) -> Result<RelationReport> {
        if relations.is_empty() {
            return Ok(RelationReport::default());
        }

        let mut endpoint_ids: Vec<String> = relations
            .iter()
            .flat_map(|r| [r.source_id.clone(), r.target_id.clone()])
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        endpoint_ids.sort_unstable();

        let existing = self.vector.existing_ids(collection, &endpoint_ids).await?;

        let mut accepted = Vec::with_capacity(relations.len());
        let mut rejected = Vec::new();
        for relation in relations {
            let missing = if !existing.contains(&relation.source_id) {
                Some(relation.source_id.clone())
            } else if !existing.contains(&relation.target_id) {
                Some(relation.target_id.clone())
            } else {
                None
            };

            match missing {
                Some(missing) => {
                    let reason =
                        RagError::referential_integrity(&relation.id, &missing).to_string();
                    warn!(collection, relation = %relation.id, %missing, "relation rejected");
                    rejected.push(RejectedRelation { relation, reason });
                }
                None => accepted.push(relation),
            }
        }

        if !accepted.is_empty() {
            self.graph.upsert_relations(collection, &accepted).await?;
        }
        debug!(
            collection,
            accepted = accepted.len(),
            rejected = rejected.len(),
            "indexed relations"
        );

        Ok(RelationReport {
            accepted: accepted.len(),
            rejected,
        })
    }
}
