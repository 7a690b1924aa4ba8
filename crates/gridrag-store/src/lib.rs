//! gridrag-store - SQLite store adapters
//!
//! Two independent adapters: a vector store (chunk payloads + embeddings,
//! brute-force cosine search) and a graph store (typed weighted edges with
//! breadth-first expansion). Each owns its own database file and health
//! probe, so one can fail while the other keeps answering.

mod graph;
mod schema;
mod vector;

pub use graph::SqliteGraphStore;
pub use vector::SqliteVectorStore;

// Re-export the store traits for convenience
pub use gridrag_core::{GraphStore, VectorStore};
