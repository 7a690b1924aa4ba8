//! Deterministic mock embedder.
//!
//! Produces stable unit vectors from a text hash. Used in tests and for
//! offline smoke runs where no provider is reachable.

use async_trait::async_trait;

use gridrag_core::{Embedder, RagError, Result};

/// A mock embedder that requires no external provider.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Create a mock embedder with a small default dimension.
    pub fn new() -> Self {
        Self { dimension: 64 }
    }

    /// Create a mock embedder with a custom dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Hash-derived unit vector for one text.
    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(text.as_bytes());
        let mut reader = hasher.finalize_xof();

        let mut bytes = vec![0u8; self.dimension * 4];
        reader.fill(&mut bytes);

        let mut v: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| {
                let raw = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                // Map into [-1, 1].
                (raw as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32
            })
            .collect();

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_documents(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("no embedding returned"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed_query("quarterly budget").await.unwrap();
        let b = embedder.embed_query("quarterly budget").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_distinct_texts_differ() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed_query("alpha").await.unwrap();
        let b = embedder.embed_query("beta").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_unit_norm_and_dimension() {
        let embedder = MockEmbedder::with_dimension(32);
        let v = embedder.embed_query("anything").await.unwrap();
        assert_eq!(v.len(), 32);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = MockEmbedder::new();
        let batch = embedder.embed_documents(&["one", "two"]).await.unwrap();
        let single = embedder.embed_query("two").await.unwrap();
        assert_eq!(batch[1], single);
    }
}
