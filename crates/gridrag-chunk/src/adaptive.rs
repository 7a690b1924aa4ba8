//! Adaptive strategy selection from document shape.
//!
//! Picks a concrete strategy per document, then re-checks every emitted
//! relation endpoint against the chunk set just produced. Historically this
//! selection path emitted relations referencing chunk ids that were never
//! materialized; whether that was a forward-reference scheme or an ordering
//! bug is unresolved, so the check keeps the failure visible instead of
//! papering over it.

use serde_json::json;

use gridrag_core::{ChunkOutput, ChunkingConfig, Document, Result};

use crate::spec::StrategySpec;
use crate::{entity, hierarchy, validate};

/// Wide documents fall back to column grouping.
const WIDE_COLUMN_THRESHOLD: usize = 8;

pub(crate) fn chunk(doc: &Document, config: &ChunkingConfig) -> Result<ChunkOutput> {
    let delegate = select(doc, config);
    delegate.validate()?;
    let mut output = crate::engine::run_spec(doc, &delegate, config)?;

    for chunk in &mut output.chunks {
        chunk
            .metadata
            .insert("selected_by".to_string(), json!("adaptive_smart"));
        chunk.metadata.insert(
            "selected_strategy".to_string(),
            json!(delegate.strategy().tag()),
        );
    }

    validate::verify_relation_endpoints(&output.chunks, &output.relations)?;
    Ok(output)
}

/// Shape heuristics, first match wins:
/// small documents read fine as plain row windows; a section-like column
/// makes the hierarchy worthwhile; repeated entity keys mean entity grouping;
/// very wide sheets group better by column; everything else gets overlapping
/// windows.
pub(crate) fn select(doc: &Document, config: &ChunkingConfig) -> StrategySpec {
    if doc.rows.len() <= config.rows_per_chunk * 2 {
        return StrategySpec::RowBased {
            rows_per_chunk: config.rows_per_chunk,
        };
    }

    if hierarchy::detect_section_column(doc).is_some() {
        return StrategySpec::Hierarchical {
            section_column: None,
            leaf_rows: config.leaf_rows,
        };
    }

    if let Some(column) = entity::detect_entity_column(doc) {
        if has_repeated_values(doc, &column) {
            return StrategySpec::EntityCentric {
                entity_column: Some(column),
            };
        }
    }

    if doc.columns.len() >= WIDE_COLUMN_THRESHOLD {
        return StrategySpec::ColumnSemantic {
            rows_per_chunk: config.rows_per_chunk,
        };
    }

    StrategySpec::SlidingWindow {
        window: config.window,
        overlap: config.overlap,
    }
}

fn has_repeated_values(doc: &Document, column: &str) -> bool {
    let mut values: Vec<&str> = doc
        .rows
        .iter()
        .filter_map(|row| row.cell(column))
        .collect();
    let total = values.len();
    values.sort_unstable();
    values.dedup();
    total > values.len()
}
