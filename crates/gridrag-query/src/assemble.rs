//! Result assembly: truncate, attach payloads, rank.

use std::collections::HashMap;

use gridrag_core::{Chunk, FusedCandidate, Result, SearchHit, VectorStore};

/// Trim the fused list to `top_k`, attach chunk payloads, and assign 1-based
/// ranks. Candidates whose payload has vanished from the store are skipped,
/// never padded with placeholders.
pub(crate) async fn attach_payloads<V>(
    store: &V,
    collection: &str,
    fused: Vec<FusedCandidate>,
    top_k: u32,
) -> Result<Vec<SearchHit>>
where
    V: VectorStore + ?Sized,
{
    let top: Vec<FusedCandidate> = fused.into_iter().take(top_k as usize).collect();
    let ids: Vec<String> = top.iter().map(|c| c.chunk_id.clone()).collect();

    let chunks = store.fetch_chunks(collection, &ids).await?;
    let mut by_id: HashMap<String, Chunk> =
        chunks.into_iter().map(|c| (c.id.clone(), c)).collect();

    let mut hits = Vec::with_capacity(top.len());
    for candidate in top {
        let Some(chunk) = by_id.remove(&candidate.chunk_id) else {
            continue;
        };
        hits.push(SearchHit {
            rank: hits.len() as u32 + 1,
            chunk_id: candidate.chunk_id,
            vector_score: candidate.vector_score,
            graph_score: candidate.graph_score,
            fused_score: candidate.fused_score,
            chunk,
        });
    }

    Ok(hits)
}
