//! gridrag-embed - Embedding provider clients
//!
//! The embedding model is an external capability. This crate provides the
//! HTTP client for an OpenAI-compatible provider (with batching, bearer
//! auth, and bounded retry on throttling) plus a deterministic mock for
//! tests and offline runs.

mod http;
mod mock;

pub use http::HttpEmbedder;
pub use mock::MockEmbedder;

// Re-export the Embedder trait for convenience
pub use gridrag_core::Embedder;
