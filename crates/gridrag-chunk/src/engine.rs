//! Strategy dispatch.

use tracing::debug;

use gridrag_core::{ChunkOutput, ChunkingConfig, Document, Result};

use crate::spec::StrategySpec;
use crate::{adaptive, columns, entity, hierarchy, row_based, sliding, topic, validate};

/// Splits documents into chunks plus inter-chunk relations under a selected
/// strategy. Pure: no I/O, no shared state; indexing happens elsewhere.
pub struct ChunkingEngine {
    config: ChunkingConfig,
}

impl ChunkingEngine {
    /// Create an engine with the given chunking defaults.
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// The spec configured as this engine's default strategy.
    pub fn default_spec(&self) -> StrategySpec {
        let strategy = gridrag_core::ChunkStrategy::from_tag(&self.config.default_strategy)
            .unwrap_or(gridrag_core::ChunkStrategy::RowBased);
        StrategySpec::from_config(strategy, &self.config)
    }

    /// Chunk one document. Parameters are validated before any chunk is
    /// produced; an empty document yields an empty output, not an error.
    /// Every emitted relation's endpoints are checked against the produced
    /// chunk set.
    pub fn chunk(&self, doc: &Document, spec: &StrategySpec) -> Result<ChunkOutput> {
        spec.validate()?;

        if doc.rows.is_empty() {
            return Ok(ChunkOutput::default());
        }

        let output = run_spec(doc, spec, &self.config)?;

        debug!(
            doc_id = %doc.id,
            strategy = %spec.strategy(),
            chunks = output.chunks.len(),
            relations = output.relations.len(),
            "chunked document"
        );

        validate::verify_relation_endpoints(&output.chunks, &output.relations)?;
        Ok(output)
    }
}

impl Default for ChunkingEngine {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

/// Run a validated spec against a non-empty document. Shared by the engine
/// and by adaptive selection (which never delegates back to itself).
pub(crate) fn run_spec(
    doc: &Document,
    spec: &StrategySpec,
    config: &ChunkingConfig,
) -> Result<ChunkOutput> {
    Ok(match spec {
        StrategySpec::RowBased { rows_per_chunk } => row_based::chunk(doc, *rows_per_chunk),
        StrategySpec::SlidingWindow { window, overlap } => sliding::chunk(doc, *window, *overlap),
        StrategySpec::Hierarchical {
            section_column,
            leaf_rows,
        } => hierarchy::chunk(doc, section_column.as_deref(), *leaf_rows),
        StrategySpec::ColumnSemantic { rows_per_chunk } => columns::chunk(doc, *rows_per_chunk),
        StrategySpec::EntityCentric { entity_column } => {
            entity::chunk(doc, entity_column.as_deref())
        }
        StrategySpec::TopicClustering {
            clusters,
            max_iterations,
        } => topic::chunk(doc, *clusters, *max_iterations, config)?,
        StrategySpec::AdaptiveSmart => adaptive::chunk(doc, config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{assert_rows_covered, numbered_doc, sectioned_doc};
    use gridrag_core::{ChunkStrategy, RagError};
    use std::collections::HashSet;

    fn engine() -> ChunkingEngine {
        ChunkingEngine::default()
    }

    fn all_specs() -> Vec<StrategySpec> {
        let config = ChunkingConfig::default();
        [
            ChunkStrategy::RowBased,
            ChunkStrategy::SlidingWindow,
            ChunkStrategy::Hierarchical,
            ChunkStrategy::ColumnSemantic,
            ChunkStrategy::EntityCentric,
            ChunkStrategy::TopicClustering,
            ChunkStrategy::AdaptiveSmart,
        ]
        .into_iter()
        .map(|s| StrategySpec::from_config(s, &config))
        .collect()
    }

    #[test]
    fn test_empty_document_yields_empty_output() {
        let doc = numbered_doc(0);
        for spec in all_specs() {
            let out = engine().chunk(&doc, &spec).unwrap();
            assert!(out.chunks.is_empty(), "{:?}", spec);
            assert!(out.relations.is_empty());
        }
    }

    #[test]
    fn test_every_strategy_covers_every_row() {
        let doc = sectioned_doc(&[("alpha", 9), ("beta", 8)]);
        for spec in all_specs() {
            let out = engine().chunk(&doc, &spec).unwrap();
            assert_rows_covered(&doc, &out.chunks);
        }
    }

    #[test]
    fn test_chunk_ids_unique_per_run() {
        let doc = sectioned_doc(&[("alpha", 9), ("beta", 8)]);
        for spec in all_specs() {
            let out = engine().chunk(&doc, &spec).unwrap();
            let ids: HashSet<&str> = out.chunks.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(ids.len(), out.chunks.len(), "{:?}", spec);
        }
    }

    #[test]
    fn test_every_strategy_emits_valid_relations() {
        let doc = sectioned_doc(&[("alpha", 9), ("beta", 8)]);
        for spec in all_specs() {
            let out = engine().chunk(&doc, &spec).unwrap();
            assert!(
                validate::verify_relation_endpoints(&out.chunks, &out.relations).is_ok(),
                "{:?}",
                spec
            );
        }
    }

    #[test]
    fn test_bad_params_rejected_before_chunking() {
        let doc = numbered_doc(10);
        let err = engine()
            .chunk(
                &doc,
                &StrategySpec::SlidingWindow {
                    window: 4,
                    overlap: 4,
                },
            )
            .unwrap_err();
        assert!(matches!(err, RagError::Configuration { .. }));
    }

    #[test]
    fn test_reproducible_output() {
        let doc = sectioned_doc(&[("alpha", 6), ("beta", 6)]);
        for spec in all_specs() {
            let a = engine().chunk(&doc, &spec).unwrap();
            let b = engine().chunk(&doc, &spec).unwrap();
            let ids_a: Vec<_> = a.chunks.iter().map(|c| (c.id.clone(), c.content.clone())).collect();
            let ids_b: Vec<_> = b.chunks.iter().map(|c| (c.id.clone(), c.content.clone())).collect();
            assert_eq!(ids_a, ids_b, "{:?}", spec);
            let rels_a: Vec<_> = a.relations.iter().map(|r| r.id.clone()).collect();
            let rels_b: Vec<_> = b.relations.iter().map(|r| r.id.clone()).collect();
            assert_eq!(rels_a, rels_b);
        }
    }

    #[test]
    fn test_default_spec_follows_config() {
        let engine = ChunkingEngine::default();
        assert_eq!(
            engine.default_spec().strategy(),
            ChunkStrategy::RowBased
        );
    }
}
