//! Topic clustering over deterministic row feature vectors.
//!
//! Rows are embedded with hashed term frequencies (no external provider, so
//! chunking stays a pure function) and grouped with k-means. Cluster count,
//! iteration count, row count, and wall-clock are all bounded; blowing a
//! bound fails the document instead of stalling the ingestion worker.

use std::time::{Duration, Instant};

use serde_json::json;

use gridrag_core::{
    Chunk, ChunkOutput, ChunkStrategy, ChunkingConfig, Document, RagError, Result,
};

/// Hashed feature space for row vectors.
const FEATURE_DIM: usize = 64;

pub(crate) fn chunk(
    doc: &Document,
    clusters: usize,
    max_iterations: usize,
    config: &ChunkingConfig,
) -> Result<ChunkOutput> {
    if doc.rows.len() > config.cluster_max_rows {
        return Err(RagError::store_unavailable(
            "topic_clustering",
            format!(
                "document has {} rows, clustering is capped at {}",
                doc.rows.len(),
                config.cluster_max_rows
            ),
        ));
    }

    let budget = Duration::from_millis(config.cluster_budget_ms);
    let vectors: Vec<[f32; FEATURE_DIM]> = doc
        .rows
        .iter()
        .map(|row| row_vector(&doc.render_row(row)))
        .collect();

    let k = clusters.min(doc.rows.len());
    let assignments = kmeans(&vectors, k, max_iterations, budget)?;

    // Collect members per cluster, ordered by first member row so cluster
    // numbering is stable.
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (row_idx, &cluster) in assignments.iter().enumerate() {
        members[cluster].push(row_idx);
    }
    let mut clusters_in_order: Vec<Vec<usize>> =
        members.into_iter().filter(|m| !m.is_empty()).collect();
    clusters_in_order.sort_by_key(|m| m[0]);

    let mut chunks = Vec::new();
    for (seq, member_rows) in clusters_in_order.iter().enumerate() {
        let rows: Vec<&gridrag_core::Row> =
            member_rows.iter().map(|&i| &doc.rows[i]).collect();
        let indices: Vec<u32> = rows.iter().map(|r| r.index).collect();
        chunks.push(
            Chunk::new(
                doc.id,
                ChunkStrategy::TopicClustering,
                seq as u32,
                doc.render_rows(&rows),
                indices[0],
                indices[indices.len() - 1],
            )
            .with_meta("cluster", json!(seq))
            .with_meta("cluster_size", json!(rows.len()))
            .with_meta("row_indices", json!(indices)),
        );
    }

    // Clustering-only: consumers infer grouping from metadata.
    Ok(ChunkOutput {
        chunks,
        relations: Vec::new(),
    })
}

/// Hashed term-frequency vector for one row's rendered text, L2-normalized.
fn row_vector(text: &str) -> [f32; FEATURE_DIM] {
    let mut v = [0.0f32; FEATURE_DIM];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
    {
        let lowered = token.to_lowercase();
        v[feature_index(&lowered)] += 1.0;
    }

    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Stable token → feature slot mapping. Uses blake3 so the mapping never
/// shifts between runs or toolchains.
fn feature_index(token: &str) -> usize {
    let digest = blake3::hash(token.as_bytes());
    let bytes: [u8; 8] = digest.as_bytes()[..8].try_into().unwrap_or([0; 8]);
    (u64::from_le_bytes(bytes) % FEATURE_DIM as u64) as usize
}

/// K-means with deterministic seeding (evenly spaced rows). Stops on
/// convergence, iteration cap, or the wall-clock budget.
fn kmeans(
    vectors: &[[f32; FEATURE_DIM]],
    k: usize,
    max_iterations: usize,
    budget: Duration,
) -> Result<Vec<usize>> {
    let n = vectors.len();
    if k <= 1 || n <= k {
        // Degenerate cases: everything in one cluster, or one row per cluster.
        return Ok((0..n).map(|i| if k <= 1 { 0 } else { i }).collect());
    }

    let start = Instant::now();
    let mut centroids: Vec<[f32; FEATURE_DIM]> =
        (0..k).map(|i| vectors[i * n / k]).collect();
    let mut assignments = vec![0usize; n];

    for _ in 0..max_iterations {
        if start.elapsed() > budget {
            return Err(RagError::store_unavailable(
                "topic_clustering",
                "clustering exceeded its latency budget",
            ));
        }

        let mut changed = false;
        for (i, vector) in vectors.iter().enumerate() {
            let nearest = nearest_centroid(vector, &centroids);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        // Recompute centroids as member means; empty centroids keep their
        // previous position.
        let mut sums = vec![[0.0f32; FEATURE_DIM]; k];
        let mut counts = vec![0usize; k];
        for (i, vector) in vectors.iter().enumerate() {
            let c = assignments[i];
            counts[c] += 1;
            for (s, x) in sums[c].iter_mut().zip(vector.iter()) {
                *s += x;
            }
        }
        for (c, sum) in sums.into_iter().enumerate() {
            if counts[c] > 0 {
                let mut mean = sum;
                for x in &mut mean {
                    *x /= counts[c] as f32;
                }
                centroids[c] = mean;
            }
        }
    }

    Ok(assignments)
}

fn nearest_centroid(vector: &[f32; FEATURE_DIM], centroids: &[[f32; FEATURE_DIM]]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (c, centroid) in centroids.iter().enumerate() {
        let dist: f32 = vector
            .iter()
            .zip(centroid.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{assert_rows_covered, numbered_doc, themed_doc};

    #[test]
    fn test_clusters_cover_all_rows() {
        let doc = themed_doc();
        let out = chunk(&doc, 2, 16, &ChunkingConfig::default()).unwrap();
        assert!(!out.chunks.is_empty());
        assert!(out.chunks.len() <= 2);
        assert_rows_covered(&doc, &out.chunks);
        assert!(out.relations.is_empty());
    }

    #[test]
    fn test_deterministic_assignments() {
        let doc = themed_doc();
        let config = ChunkingConfig::default();
        let a = chunk(&doc, 3, 16, &config).unwrap();
        let b = chunk(&doc, 3, 16, &config).unwrap();
        let rows_a: Vec<_> = a.chunks.iter().map(|c| c.metadata["row_indices"].clone()).collect();
        let rows_b: Vec<_> = b.chunks.iter().map(|c| c.metadata["row_indices"].clone()).collect();
        assert_eq!(rows_a, rows_b);
    }

    #[test]
    fn test_row_cap_fails_fast() {
        let mut config = ChunkingConfig::default();
        config.cluster_max_rows = 5;
        let doc = numbered_doc(10);
        let err = chunk(&doc, 2, 16, &config).unwrap_err();
        assert!(matches!(err, RagError::StoreUnavailable { .. }));
    }

    #[test]
    fn test_more_clusters_than_rows() {
        let doc = numbered_doc(3);
        let out = chunk(&doc, 10, 16, &ChunkingConfig::default()).unwrap();
        assert_eq!(out.chunks.len(), 3);
    }

    #[test]
    fn test_feature_index_stable() {
        assert_eq!(feature_index("budget"), feature_index("budget"));
        assert!(feature_index("budget") < FEATURE_DIM);
    }
}
