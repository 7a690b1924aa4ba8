//! Relation endpoint integrity at the emission boundary.

use std::collections::HashSet;

use gridrag_core::{Chunk, RagError, Relation, Result};

/// Verify that every relation endpoint resolves to a chunk in the given set.
///
/// A dangling endpoint surfaces as a `ReferentialIntegrity` error instead of
/// flowing downstream as a corrupted graph edge.
pub fn verify_relation_endpoints(chunks: &[Chunk], relations: &[Relation]) -> Result<()> {
    let ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();

    for relation in relations {
        if !ids.contains(relation.source_id.as_str()) {
            return Err(RagError::referential_integrity(
                &relation.id,
                &relation.source_id,
            ));
        }
        if !ids.contains(relation.target_id.as_str()) {
            return Err(RagError::referential_integrity(
                &relation.id,
                &relation.target_id,
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridrag_core::{ChunkStrategy, RelationKind};
    use ulid::Ulid;

    fn chunk(doc_id: Ulid, seq: u32) -> Chunk {
        Chunk::new(
            doc_id,
            ChunkStrategy::RowBased,
            seq,
            format!("chunk {}", seq),
            seq,
            seq,
        )
    }

    #[test]
    fn test_valid_relations_pass() {
        let doc_id = Ulid::new();
        let chunks = vec![chunk(doc_id, 0), chunk(doc_id, 1)];
        let relations = vec![Relation::new(
            &chunks[0].id,
            &chunks[1].id,
            RelationKind::Sequential,
            1.0,
        )];
        assert!(verify_relation_endpoints(&chunks, &relations).is_ok());
    }

    #[test]
    fn test_dangling_target_caught() {
        let doc_id = Ulid::new();
        let chunks = vec![chunk(doc_id, 0)];
        let phantom = Chunk::derive_id(doc_id, ChunkStrategy::RowBased, 9);
        let relations = vec![Relation::new(
            &chunks[0].id,
            &phantom,
            RelationKind::Sequential,
            1.0,
        )];
        let err = verify_relation_endpoints(&chunks, &relations).unwrap_err();
        match err {
            RagError::ReferentialIntegrity { missing, .. } => assert_eq!(missing, phantom),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dangling_source_caught() {
        let doc_id = Ulid::new();
        let chunks = vec![chunk(doc_id, 0)];
        let phantom = Chunk::derive_id(doc_id, ChunkStrategy::RowBased, 7);
        let relations = vec![Relation::new(
            &phantom,
            &chunks[0].id,
            RelationKind::Sibling,
            0.5,
        )];
        assert!(verify_relation_endpoints(&chunks, &relations).is_err());
    }
}
