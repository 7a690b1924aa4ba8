//! gridrag-engine - Ingestion pipeline and retrieval facade
//!
//! Wires the chunking engine, the embedding provider, and the two store
//! adapters into the external surface: batch ingestion with per-document
//! error isolation, hybrid search with degraded-mode handling, cascading
//! document deletion, and per-store health.

mod engine;
mod indexer;
mod ingest;

pub use engine::RetrievalEngine;
pub use indexer::{RejectedRelation, RelationIndexer, RelationReport, VectorIndexer};
pub use ingest::{DocumentReport, IngestReport};

// Re-export the pieces callers need to drive the engine
pub use gridrag_chunk::StrategySpec;
pub use gridrag_core::{Document, HealthStatus, RagConfig, Row, SearchResponse};
pub use gridrag_query::SearchOptions;
