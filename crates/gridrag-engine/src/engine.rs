//! The retrieval engine facade: ingestion, hybrid search, deletion, health.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use gridrag_chunk::{ChunkingEngine, StrategySpec};
use gridrag_core::{
    collection_slug, Document, Embedder, GraphStore, HealthStatus, RagConfig, Result,
    SearchResponse, VectorStore,
};
use gridrag_query::{QueryPlanner, SearchOptions};
use ulid::Ulid;

use crate::indexer::{RelationIndexer, VectorIndexer};
use crate::ingest::{DocumentReport, IngestReport};

/// Engine facade over explicit store and embedder handles.
///
/// Handles are constructed once by the caller and shared by reference;
/// nothing here is ambient global state.
pub struct RetrievalEngine<V, G, E> {
    vector: Arc<V>,
    graph: Arc<G>,
    embedder: Arc<E>,
    chunker: Arc<ChunkingEngine>,
    planner: QueryPlanner<V, G, E>,
    config: RagConfig,
}

impl<V, G, E> RetrievalEngine<V, G, E>
where
    V: VectorStore + 'static,
    G: GraphStore + 'static,
    E: Embedder + 'static,
{
    /// Create an engine from store and embedder handles plus configuration.
    pub fn new(vector: Arc<V>, graph: Arc<G>, embedder: Arc<E>, config: RagConfig) -> Self {
        let chunker = Arc::new(ChunkingEngine::new(config.chunking.clone()));
        let planner = QueryPlanner::new(
            vector.clone(),
            graph.clone(),
            embedder.clone(),
            config.search.clone(),
        );
        Self {
            vector,
            graph,
            embedder,
            chunker,
            planner,
            config,
        }
    }

    /// The spec configured as the default chunking strategy.
    pub fn default_strategy(&self) -> StrategySpec {
        self.chunker.default_spec()
    }

    fn slug(&self, department: &str) -> String {
        collection_slug(department, &self.config.collection_aliases)
    }

    /// Ingest a batch of documents under one strategy.
    ///
    /// Documents are processed concurrently up to the configured worker
    /// bound. One document's failure never aborts the batch; outcomes are
    /// reported per document along with a resume checkpoint. `resume_after`
    /// skips every document up to and including a prior checkpoint.
    pub async fn ingest_batch(
        &self,
        documents: Vec<Document>,
        spec: &StrategySpec,
        resume_after: Option<Ulid>,
    ) -> Result<IngestReport> {
        spec.validate()?;

        let run_id = Ulid::new();
        let start = match resume_after {
            Some(id) => documents
                .iter()
                .position(|d| d.id == id)
                .map(|i| i + 1)
                .unwrap_or(0),
            None => 0,
        };

        let semaphore = Arc::new(Semaphore::new(self.config.ingest.concurrency));
        let mut handles = Vec::new();

        for document in documents.into_iter().skip(start) {
            let semaphore = semaphore.clone();
            let vector = self.vector.clone();
            let graph = self.graph.clone();
            let embedder = self.embedder.clone();
            let chunker = self.chunker.clone();
            let spec = spec.clone();
            let collection = self.slug(&document.collection);

            handles.push(tokio::spawn(async move {
                // Semaphore is never closed; a failed acquire only means we
                // run unthrottled.
                let _permit = semaphore.acquire_owned().await.ok();
                ingest_one(
                    &collection, document, &spec, chunker, vector, graph, embedder, run_id,
                )
                .await
            }));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => warn!("ingestion worker panicked: {}", e),
            }
        }

        let report = IngestReport::with_checkpoint(run_id, reports);
        info!(
            run_id = %report.run_id,
            documents = report.documents.len(),
            failed = report.failed_documents(),
            chunks = report.total_chunks(),
            "ingestion batch finished"
        );
        Ok(report)
    }

    /// Hybrid search over one department's collection.
    pub async fn search_hybrid(
        &self,
        department: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        let collection = self.slug(department);
        self.planner.search(&collection, query, options).await
    }

    /// Delete a document: relation edges touching its chunks first, then the
    /// chunk vectors.
    pub async fn delete_document(&self, department: &str, doc_id: Ulid) -> Result<()> {
        let collection = self.slug(department);
        let chunk_ids = self
            .vector
            .chunk_ids_for_document(&collection, doc_id)
            .await?;
        if chunk_ids.is_empty() {
            return Ok(());
        }

        self.graph
            .delete_relations_touching(&collection, &chunk_ids)
            .await?;
        self.vector.delete_chunks(&collection, &chunk_ids).await?;
        info!(collection, %doc_id, chunks = chunk_ids.len(), "deleted document");
        Ok(())
    }

    /// Per-store reachability.
    pub async fn health(&self) -> HealthStatus {
        let (vector, graph) = tokio::join!(self.vector.ping(), self.graph.ping());
        HealthStatus {
            vector_ok: vector.is_ok(),
            graph_ok: graph.is_ok(),
        }
    }
}

/// Chunk and index one document, isolating its errors into the report.
#[allow(clippy::too_many_arguments)]
async fn ingest_one<V, G, E>(
    collection: &str,
    document: Document,
    spec: &StrategySpec,
    chunker: Arc<ChunkingEngine>,
    vector: Arc<V>,
    graph: Arc<G>,
    embedder: Arc<E>,
    run_id: Ulid,
) -> DocumentReport
where
    V: VectorStore,
    G: GraphStore,
    E: Embedder,
{
    let doc_id = document.id;
    let document_name = document.name.clone();

    let outcome = async {
        let mut output = chunker.chunk(&document, spec)?;
        for chunk in &mut output.chunks {
            chunk
                .metadata
                .insert("run_id".to_string(), json!(run_id.to_string()));
        }

        let chunks = VectorIndexer::new(vector.clone(), embedder)
            .index(collection, output.chunks)
            .await?;
        let relation_report = RelationIndexer::new(vector, graph)
            .index(collection, output.relations)
            .await?;
        Ok::<_, gridrag_core::RagError>((chunks.len(), relation_report))
    }
    .await;

    match outcome {
        Ok((chunks_indexed, relation_report)) => DocumentReport {
            doc_id,
            document_name,
            chunks_indexed,
            relations_accepted: relation_report.accepted,
            rejected_relations: relation_report.rejected,
            error: None,
        },
        Err(e) => {
            warn!(%doc_id, "document failed: {}", e);
            DocumentReport {
                doc_id,
                document_name,
                chunks_indexed: 0,
                relations_accepted: 0,
                rejected_relations: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}
