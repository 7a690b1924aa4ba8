//! Entity-centric chunking: one chunk per entity key value.

use std::collections::{HashMap, HashSet};

use serde_json::json;

use gridrag_core::{Chunk, ChunkOutput, ChunkStrategy, Document, Relation, RelationKind, Row};

use crate::columns::classify_column;

/// Key for rows whose entity cell is blank; keeps every row covered.
const MISSING_KEY: &str = "(missing)";

/// Cap on links emitted per shared attribute value. A value shared by every
/// entity (for example a constant status column) must not produce a clique.
const MAX_LINKS_PER_VALUE: usize = 8;

/// Strength for shared-attribute links.
const SHARED_STRENGTH: f32 = 0.5;

pub(crate) fn chunk(doc: &Document, entity_column: Option<&str>) -> ChunkOutput {
    let entity_column = entity_column
        .map(String::from)
        .or_else(|| detect_entity_column(doc))
        .unwrap_or_else(|| doc.columns.first().cloned().unwrap_or_default());

    // Group rows by entity key in first-appearance order.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&Row>> = HashMap::new();
    for row in &doc.rows {
        let key = row
            .cell(&entity_column)
            .map(str::to_string)
            .unwrap_or_else(|| MISSING_KEY.to_string());
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    let mut chunks = Vec::new();
    for (seq, key) in order.iter().enumerate() {
        let rows = &groups[key];
        let indices: Vec<u32> = rows.iter().map(|r| r.index).collect();
        let content = format!(
            "{}: {}\n{}",
            entity_column,
            key,
            doc.render_rows(rows)
        );
        chunks.push(
            Chunk::new(
                doc.id,
                ChunkStrategy::EntityCentric,
                seq as u32,
                content,
                indices[0],
                indices[indices.len() - 1],
            )
            .with_meta("entity_column", json!(entity_column))
            .with_meta("entity_key", json!(key))
            .with_meta("row_indices", json!(indices)),
        );
    }

    let relations = shared_attribute_links(doc, &entity_column, &order, &groups, &chunks);

    ChunkOutput { chunks, relations }
}

/// Link entities that share an attribute value in some non-key column.
fn shared_attribute_links(
    doc: &Document,
    entity_column: &str,
    order: &[String],
    groups: &HashMap<String, Vec<&Row>>,
    chunks: &[Chunk],
) -> Vec<Relation> {
    let chunk_index: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, key)| (key.as_str(), i))
        .collect();

    let mut relations = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for column in &doc.columns {
        if column == entity_column {
            continue;
        }

        // value → entity keys holding it, in entity order.
        let mut by_value: Vec<(String, Vec<&str>)> = Vec::new();
        for key in order {
            let mut values: Vec<&str> = groups[key]
                .iter()
                .filter_map(|row| row.cell(column))
                .collect();
            values.sort_unstable();
            values.dedup();
            for value in values {
                match by_value.iter_mut().find(|(v, _)| v.as_str() == value) {
                    Some((_, keys)) => {
                        if keys.last() != Some(&key.as_str()) {
                            keys.push(key.as_str());
                        }
                    }
                    None => by_value.push((value.to_string(), vec![key.as_str()])),
                }
            }
        }

        for (value, keys) in by_value {
            if keys.len() < 2 {
                continue;
            }
            for pair in keys.windows(2).take(MAX_LINKS_PER_VALUE) {
                let source = &chunks[chunk_index[pair[0]]];
                let target = &chunks[chunk_index[pair[1]]];
                let relation = Relation::new(
                    &source.id,
                    &target.id,
                    RelationKind::EntityShared,
                    SHARED_STRENGTH,
                )
                .with_meta("shared_column", json!(column))
                .with_meta("shared_value", json!(&value));
                if seen.insert(relation.id.clone()) {
                    relations.push(relation);
                }
            }
        }
    }

    relations
}

/// First identifier-classified column, if any.
pub(crate) fn detect_entity_column(doc: &Document) -> Option<String> {
    doc.columns
        .iter()
        .find(|column| classify_column(column) == "identifier")
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{assert_rows_covered, owner_doc};

    #[test]
    fn test_one_chunk_per_entity() {
        // Rows for three distinct owners.
        let doc = owner_doc(&[
            ("emp-1", "proj-a"),
            ("emp-2", "proj-a"),
            ("emp-1", "proj-b"),
            ("emp-3", "proj-c"),
        ]);
        let out = chunk(&doc, Some("owner_id"));
        assert_eq!(out.chunks.len(), 3);
        assert_eq!(out.chunks[0].metadata["entity_key"], json!("emp-1"));
    }

    #[test]
    fn test_shared_attribute_links_entities() {
        // emp-1 and emp-2 share proj-a.
        let doc = owner_doc(&[
            ("emp-1", "proj-a"),
            ("emp-2", "proj-a"),
            ("emp-3", "proj-c"),
        ]);
        let out = chunk(&doc, Some("owner_id"));
        let shared: Vec<_> = out
            .relations
            .iter()
            .filter(|r| r.kind == RelationKind::EntityShared)
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].metadata["shared_value"], json!("proj-a"));
    }

    #[test]
    fn test_blank_keys_grouped_not_dropped() {
        let doc = owner_doc(&[("emp-1", "proj-a"), ("", "proj-b")]);
        let out = chunk(&doc, Some("owner_id"));
        assert_eq!(out.chunks.len(), 2);
        assert_rows_covered(&doc, &out.chunks);
    }

    #[test]
    fn test_auto_detects_identifier_column() {
        let doc = owner_doc(&[("emp-1", "proj-a")]);
        assert_eq!(detect_entity_column(&doc).as_deref(), Some("owner_id"));
    }

    #[test]
    fn test_link_fan_out_bounded() {
        // 20 entities all sharing one project value.
        let rows: Vec<(String, &str)> = (0..20).map(|i| (format!("emp-{}", i), "proj-x")).collect();
        let refs: Vec<(&str, &str)> = rows.iter().map(|(a, b)| (a.as_str(), *b)).collect();
        let doc = owner_doc(&refs);
        let out = chunk(&doc, Some("owner_id"));
        let shared = out
            .relations
            .iter()
            .filter(|r| r.kind == RelationKind::EntityShared)
            .count();
        assert!(shared <= MAX_LINKS_PER_VALUE);
    }
}
