//! Sheet → Section → Leaf decomposition.
//!
//! The richest relation graph of the strategies: every tree edge becomes a
//! hierarchical link and adjacent leaves under one section become siblings.

use serde_json::json;

use gridrag_core::{Chunk, ChunkOutput, ChunkStrategy, Document, Relation, RelationKind, Row};

/// Column-name fragments that mark a section label column.
const SECTION_HINTS: &[&str] = &[
    "section", "category", "group", "type", "dept", "구분", "분류", "부서", "유형",
];

/// Label used for rows whose section cell is blank.
const UNSECTIONED: &str = "(none)";

/// Sibling links are weaker than the parent-child spine.
const SIBLING_STRENGTH: f32 = 0.5;

pub(crate) fn chunk(
    doc: &Document,
    section_column: Option<&str>,
    leaf_rows: usize,
) -> ChunkOutput {
    let section_column = section_column
        .map(String::from)
        .or_else(|| detect_section_column(doc));

    let sections = group_into_sections(doc, section_column.as_deref());

    let mut chunks = Vec::new();
    let mut relations = Vec::new();
    let mut seq = 0u32;

    // Sheet root summarizes the whole document.
    let sheet_content = format!(
        "{}\ncolumns: {}\nrows: {}",
        doc.name,
        doc.columns.join(", "),
        doc.rows.len()
    );
    let last_row = doc.rows.last().map(|r| r.index).unwrap_or(0);
    let sheet = Chunk::new(
        doc.id,
        ChunkStrategy::Hierarchical,
        seq,
        sheet_content,
        doc.rows.first().map(|r| r.index).unwrap_or(0),
        last_row,
    )
    .with_meta("level", json!("sheet"));
    let sheet_id = sheet.id.clone();
    chunks.push(sheet);
    seq += 1;

    for (label, rows) in &sections {
        let first = rows.first().map(|r| r.index).unwrap_or(0);
        let last = rows.last().map(|r| r.index).unwrap_or(0);

        let section_chunk = Chunk::new(
            doc.id,
            ChunkStrategy::Hierarchical,
            seq,
            format!("section: {} ({} rows)", label, rows.len()),
            first,
            last,
        )
        .with_meta("level", json!("section"))
        .with_meta("section", json!(label));
        let section_id = section_chunk.id.clone();
        chunks.push(section_chunk);
        seq += 1;

        relations.push(Relation::new(
            &sheet_id,
            &section_id,
            RelationKind::Hierarchical,
            1.0,
        ));

        let mut prev_leaf: Option<String> = None;
        for leaf in rows.chunks(leaf_rows) {
            let indices: Vec<u32> = leaf.iter().map(|r| r.index).collect();
            let leaf_chunk = Chunk::new(
                doc.id,
                ChunkStrategy::Hierarchical,
                seq,
                doc.render_rows(leaf),
                indices[0],
                indices[indices.len() - 1],
            )
            .with_meta("level", json!("leaf"))
            .with_meta("section", json!(label))
            .with_meta("row_indices", json!(indices));
            let leaf_id = leaf_chunk.id.clone();
            chunks.push(leaf_chunk);
            seq += 1;

            relations.push(Relation::new(
                &section_id,
                &leaf_id,
                RelationKind::Hierarchical,
                1.0,
            ));
            if let Some(prev) = prev_leaf {
                relations.push(Relation::new(
                    &prev,
                    &leaf_id,
                    RelationKind::Sibling,
                    SIBLING_STRENGTH,
                ));
            }
            prev_leaf = Some(leaf_id);
        }
    }

    ChunkOutput { chunks, relations }
}

/// Pick a section label column by name hints. Requires at least two distinct
/// non-empty values, and fewer distinct values than rows; otherwise the
/// column does not partition anything.
pub(crate) fn detect_section_column(doc: &Document) -> Option<String> {
    for column in &doc.columns {
        let lowered = column.to_lowercase();
        if !SECTION_HINTS.iter().any(|hint| lowered.contains(hint)) {
            continue;
        }
        let mut values: Vec<&str> = doc
            .rows
            .iter()
            .filter_map(|row| row.cell(column))
            .collect();
        values.sort_unstable();
        values.dedup();
        if values.len() >= 2 && values.len() < doc.rows.len() {
            return Some(column.clone());
        }
    }
    None
}

/// Group rows by section label in first-appearance order. With no section
/// column the whole document is one section.
fn group_into_sections<'a>(
    doc: &'a Document,
    section_column: Option<&str>,
) -> Vec<(String, Vec<&'a Row>)> {
    let Some(column) = section_column else {
        return vec![("all".to_string(), doc.rows.iter().collect())];
    };

    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<&Row>> =
        std::collections::HashMap::new();

    for row in &doc.rows {
        let label = row
            .cell(column)
            .map(str::to_string)
            .unwrap_or_else(|| UNSECTIONED.to_string());
        if !groups.contains_key(&label) {
            order.push(label.clone());
        }
        groups.entry(label).or_default().push(row);
    }

    order
        .into_iter()
        .map(|label| {
            let rows = groups.remove(&label).unwrap_or_default();
            (label, rows)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{assert_rows_covered, sectioned_doc};

    #[test]
    fn test_tree_shape_and_relations() {
        // 3 sections of 4 rows each, leaf_rows = 2.
        let doc = sectioned_doc(&[("alpha", 4), ("beta", 4), ("gamma", 4)]);
        let out = chunk(&doc, Some("category"), 2);

        // 1 sheet + 3 sections + 6 leaves.
        assert_eq!(out.chunks.len(), 10);

        let hierarchical = out
            .relations
            .iter()
            .filter(|r| r.kind == RelationKind::Hierarchical)
            .count();
        let siblings = out
            .relations
            .iter()
            .filter(|r| r.kind == RelationKind::Sibling)
            .count();
        // sheet→section ×3, section→leaf ×6.
        assert_eq!(hierarchical, 9);
        // one sibling pair per section.
        assert_eq!(siblings, 3);
    }

    #[test]
    fn test_leaves_cover_all_rows() {
        let doc = sectioned_doc(&[("alpha", 5), ("beta", 3)]);
        let out = chunk(&doc, Some("category"), 2);
        assert_rows_covered(&doc, &out.chunks);
    }

    #[test]
    fn test_auto_detection_finds_hinted_column() {
        let doc = sectioned_doc(&[("alpha", 3), ("beta", 3)]);
        assert_eq!(detect_section_column(&doc).as_deref(), Some("category"));
    }

    #[test]
    fn test_no_section_column_yields_single_section() {
        let doc = crate::testutil::numbered_doc(6);
        let out = chunk(&doc, None, 3);
        // sheet + 1 section + 2 leaves.
        assert_eq!(out.chunks.len(), 4);
    }

    #[test]
    fn test_relation_count_scales_with_depth() {
        let shallow = chunk(&sectioned_doc(&[("a", 4)]), Some("category"), 4);
        let deep = chunk(
            &sectioned_doc(&[("a", 4), ("b", 4), ("c", 4), ("d", 4)]),
            Some("category"),
            2,
        );
        assert!(deep.relations.len() > shallow.relations.len());
    }
}
