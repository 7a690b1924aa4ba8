//! Score fusion: weighted combination of per-source relevance scores.

use std::collections::HashMap;

use gridrag_core::{FusedCandidate, FusionWeights};

/// A candidate before fusion: a chunk id with whatever scores its sources
/// produced.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chunk_id: String,
    pub vector_score: Option<f32>,
    pub graph_score: Option<f32>,
}

/// Union the two candidate lists by chunk id. A chunk present in both keeps
/// both scores; duplicates within one source max-merge.
pub fn merge_candidates(
    vector_hits: Option<Vec<(String, f32)>>,
    graph_hits: Option<Vec<(String, f32)>>,
) -> Vec<Candidate> {
    let mut merged: HashMap<String, (Option<f32>, Option<f32>)> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    if let Some(hits) = vector_hits {
        for (id, score) in hits {
            let entry = merged.entry(id.clone()).or_insert_with(|| {
                order.push(id);
                (None, None)
            });
            entry.0 = Some(entry.0.map_or(score, |s: f32| s.max(score)));
        }
    }
    if let Some(hits) = graph_hits {
        for (id, score) in hits {
            let entry = merged.entry(id.clone()).or_insert_with(|| {
                order.push(id);
                (None, None)
            });
            entry.1 = Some(entry.1.map_or(score, |s: f32| s.max(score)));
        }
    }

    order
        .into_iter()
        .map(|id| {
            let (vector_score, graph_score) = merged[&id];
            Candidate {
                chunk_id: id,
                vector_score,
                graph_score,
            }
        })
        .collect()
}

/// Fuse candidate scores into one descending ranking.
///
/// Each source's scores are min-max normalized across the candidate set. The
/// auxiliary signal is cross-source corroboration: 1.0 when both sources
/// returned the chunk. A candidate missing a source's score drops that term
/// and renormalizes the remaining weights proportionally, so single-source
/// results are not penalized for the absence.
///
/// Ties break on higher raw vector score, then lexicographically smaller
/// chunk id, so identical inputs always produce identical orderings.
pub fn fuse(candidates: Vec<Candidate>, weights: &FusionWeights) -> Vec<FusedCandidate> {
    let vector_range = score_range(candidates.iter().filter_map(|c| c.vector_score));
    let graph_range = score_range(candidates.iter().filter_map(|c| c.graph_score));

    let mut fused: Vec<FusedCandidate> = candidates
        .into_iter()
        .map(|c| {
            let mut score = 0.0f32;
            let mut weight_sum = 0.0f32;

            if let Some(v) = c.vector_score {
                score += weights.vector * normalize(v, vector_range);
                weight_sum += weights.vector;
            }
            if let Some(g) = c.graph_score {
                score += weights.graph * normalize(g, graph_range);
                weight_sum += weights.graph;
            }

            let auxiliary = if c.vector_score.is_some() && c.graph_score.is_some() {
                1.0
            } else {
                0.0
            };
            score += weights.auxiliary * auxiliary;
            weight_sum += weights.auxiliary;

            let fused_score = if weight_sum > 0.0 {
                score / weight_sum
            } else {
                0.0
            };

            FusedCandidate {
                chunk_id: c.chunk_id,
                vector_score: c.vector_score,
                graph_score: c.graph_score,
                fused_score,
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.fused_score
            .total_cmp(&a.fused_score)
            .then_with(|| {
                let va = a.vector_score.unwrap_or(f32::MIN);
                let vb = b.vector_score.unwrap_or(f32::MIN);
                vb.total_cmp(&va)
            })
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });

    fused
}

/// (min, max) over present scores; `None` when no candidate has one.
fn score_range(scores: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
    let mut range: Option<(f32, f32)> = None;
    for score in scores {
        range = Some(match range {
            None => (score, score),
            Some((lo, hi)) => (lo.min(score), hi.max(score)),
        });
    }
    range
}

/// Min-max normalize into [0, 1]; a degenerate range maps to 1.0.
fn normalize(score: f32, range: Option<(f32, f32)>) -> f32 {
    match range {
        Some((lo, hi)) if hi > lo => (score - lo) / (hi - lo),
        _ => 1.0,
    }
}
