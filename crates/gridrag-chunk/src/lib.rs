//! gridrag-chunk - Chunking strategies for structured documents
//!
//! Turns a parsed document (ordered rows with named columns) into an ordered
//! sequence of chunks plus a set of typed relations between them, under a
//! selectable strategy.
//!
//! # Strategies
//!
//! - `RowBased`: fixed windows of N rows (the baseline).
//! - `SlidingWindow`: overlapping windows; overlap strength links.
//! - `Hierarchical`: Sheet → Section → Leaf tree with parent/sibling links.
//! - `ColumnSemantic`: column groups by keyword classification.
//! - `EntityCentric`: one chunk per entity key; shared-attribute links.
//! - `TopicClustering`: k-means over deterministic row features.
//! - `AdaptiveSmart`: per-document shape heuristics pick one of the above.
//!
//! # Example
//!
//! ```rust
//! use gridrag_chunk::{ChunkingEngine, StrategySpec};
//! use gridrag_core::{Document, Row};
//!
//! let doc = Document::new("engineering", "roster", vec!["id".into()], vec![
//!     Row::new(0, vec![("id".to_string(), "R0".to_string())]),
//! ]);
//! let engine = ChunkingEngine::default();
//! let out = engine.chunk(&doc, &StrategySpec::RowBased { rows_per_chunk: 5 }).unwrap();
//! assert_eq!(out.chunks.len(), 1);
//! ```

mod adaptive;
mod columns;
mod engine;
mod entity;
mod hierarchy;
mod row_based;
mod sliding;
mod spec;
mod topic;
mod validate;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::ChunkingEngine;
pub use spec::StrategySpec;
pub use validate::verify_relation_endpoints;

// Re-export types for convenience
pub use gridrag_core::{Chunk, ChunkOutput, ChunkStrategy, Relation, RelationKind};
