//! Overlapping row windows with a fixed stride.

use serde_json::json;

use gridrag_core::{Chunk, ChunkOutput, ChunkStrategy, Document, Relation, RelationKind, Row};

pub(crate) fn chunk(doc: &Document, window: usize, overlap: usize) -> ChunkOutput {
    let stride = window - overlap;
    let total = doc.rows.len();

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut seq = 0u32;

    while start < total {
        let end = (start + window).min(total);
        let rows = &doc.rows[start..end];
        let refs: Vec<&Row> = rows.iter().collect();
        let content = doc.render_rows(&refs);
        chunks.push(
            Chunk::new(
                doc.id,
                ChunkStrategy::SlidingWindow,
                seq,
                content,
                rows[0].index,
                rows[rows.len() - 1].index,
            )
            .with_meta("window", json!(window))
            .with_meta("overlap", json!(overlap)),
        );
        seq += 1;

        // The window that reaches the end closes the sequence; stepping again
        // would only re-emit a suffix of it.
        if start + window >= total {
            break;
        }
        start += stride;
    }

    let strength = overlap as f32 / window as f32;
    let relations = chunks
        .windows(2)
        .map(|pair| {
            let shared = (pair[0].row_end + 1).saturating_sub(pair[1].row_start);
            Relation::new(&pair[0].id, &pair[1].id, RelationKind::Overlap, strength)
                .with_meta("shared_rows", json!(shared))
        })
        .collect();

    ChunkOutput { chunks, relations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{assert_rows_covered, numbered_doc};

    #[test]
    fn test_seven_rows_window_six_overlap_two() {
        let doc = numbered_doc(7);
        let out = chunk(&doc, 6, 2);

        assert_eq!(out.chunks.len(), 2);
        assert_eq!(out.chunks[0].row_start, 0);
        assert_eq!(out.chunks[0].row_end, 5);
        assert_eq!(out.chunks[1].row_start, 4);
        assert_eq!(out.chunks[1].row_end, 6);

        assert_eq!(out.relations.len(), 1);
        let relation = &out.relations[0];
        assert_eq!(relation.kind, RelationKind::Overlap);
        assert!((relation.strength - 2.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_exact_window_fits_in_one_chunk() {
        let doc = numbered_doc(6);
        let out = chunk(&doc, 6, 2);
        assert_eq!(out.chunks.len(), 1);
        assert!(out.relations.is_empty());
    }

    #[test]
    fn test_row_coverage_long_document() {
        let doc = numbered_doc(23);
        let out = chunk(&doc, 6, 2);
        assert_rows_covered(&doc, &out.chunks);
        // Consecutive windows really do share rows.
        for pair in out.chunks.windows(2) {
            assert!(pair[1].row_start <= pair[0].row_end);
        }
    }

    #[test]
    fn test_zero_overlap_behaves_like_fixed_windows() {
        let doc = numbered_doc(10);
        let out = chunk(&doc, 5, 0);
        assert_eq!(out.chunks.len(), 2);
        assert_eq!(out.relations.len(), 1);
        assert_eq!(out.relations[0].strength, 0.0);
    }
}
