//! Baseline strategy: fixed windows of N rows, no overlap.

use serde_json::json;

use gridrag_core::{Chunk, ChunkOutput, ChunkStrategy, Document, Relation, RelationKind, Row};

pub(crate) fn chunk(doc: &Document, rows_per_chunk: usize) -> ChunkOutput {
    let mut chunks = Vec::new();

    for (seq, window) in doc.rows.chunks(rows_per_chunk).enumerate() {
        let refs: Vec<&Row> = window.iter().collect();
        let content = doc.render_rows(&refs);
        let chunk = Chunk::new(
            doc.id,
            ChunkStrategy::RowBased,
            seq as u32,
            content,
            window[0].index,
            window[window.len() - 1].index,
        )
        .with_meta("rows", json!(window.len()));
        chunks.push(chunk);
    }

    // Adjacent windows read in order; full-strength sequential links.
    let relations = chunks
        .windows(2)
        .map(|pair| Relation::new(&pair[0].id, &pair[1].id, RelationKind::Sequential, 1.0))
        .collect();

    ChunkOutput { chunks, relations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::numbered_doc;

    #[test]
    fn test_thirty_rows_window_five_gives_six_chunks() {
        let doc = numbered_doc(30);
        let out = chunk(&doc, 5);
        assert_eq!(out.chunks.len(), 6);
        assert_eq!(out.relations.len(), 5);
        for relation in &out.relations {
            assert_eq!(relation.kind, RelationKind::Sequential);
            assert_eq!(relation.strength, 1.0);
        }
    }

    #[test]
    fn test_row_coverage() {
        let doc = numbered_doc(13);
        let out = chunk(&doc, 5);
        crate::testutil::assert_rows_covered(&doc, &out.chunks);
        // Tail window holds the remaining 3 rows.
        assert_eq!(out.chunks.len(), 3);
        assert_eq!(out.chunks[2].row_start, 10);
        assert_eq!(out.chunks[2].row_end, 12);
    }

    #[test]
    fn test_single_window_has_no_relations() {
        let doc = numbered_doc(4);
        let out = chunk(&doc, 5);
        assert_eq!(out.chunks.len(), 1);
        assert!(out.relations.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let doc = numbered_doc(12);
        let a = chunk(&doc, 5);
        let b = chunk(&doc, 5);
        let ids_a: Vec<_> = a.chunks.iter().map(|c| c.id.clone()).collect();
        let ids_b: Vec<_> = b.chunks.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.chunks[0].content, b.chunks[0].content);
    }
}
