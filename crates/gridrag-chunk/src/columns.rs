//! Column-group chunking by semantic classification rules.
//!
//! Columns are classified by keyword rules into semantic groups; each chunk
//! carries one group's columns over a window of rows. Unmatched columns land
//! in a catch-all group rather than being dropped.

use serde_json::json;

use gridrag_core::{Chunk, ChunkOutput, ChunkStrategy, Document, Row};

/// Classification rules, applied in order. First match wins.
const RULES: &[(&str, &[&str])] = &[
    (
        "identifier",
        &["id", "code", "key", "num", "번호", "코드", "사번"],
    ),
    (
        "description",
        &[
            "desc", "name", "title", "content", "summary", "이름", "제목", "내용", "설명",
        ],
    ),
    (
        "status",
        &["status", "state", "stage", "phase", "상태", "단계"],
    ),
    (
        "temporal",
        &[
            "date", "time", "created", "updated", "deadline", "일자", "날짜", "기한",
        ],
    ),
    (
        "quantity",
        &[
            "amount", "count", "qty", "quantity", "price", "cost", "total", "금액", "수량",
        ],
    ),
];

/// Catch-all group for unmatched columns.
const CATCH_ALL: &str = "general";

/// Classify a column name into a semantic group.
pub(crate) fn classify_column(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    for (group, keywords) in RULES {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return group;
        }
    }
    CATCH_ALL
}

pub(crate) fn chunk(doc: &Document, rows_per_chunk: usize) -> ChunkOutput {
    // Group columns, preserving document column order within each group.
    let mut groups: Vec<(&'static str, Vec<String>)> = Vec::new();
    for column in &doc.columns {
        let group = classify_column(column);
        match groups.iter_mut().find(|(g, _)| *g == group) {
            Some((_, columns)) => columns.push(column.clone()),
            None => groups.push((group, vec![column.clone()])),
        }
    }

    let mut chunks = Vec::new();
    let mut seq = 0u32;

    for (group, columns) in &groups {
        for window in doc.rows.chunks(rows_per_chunk) {
            let content = render_group(window, columns);
            let chunk = Chunk::new(
                doc.id,
                ChunkStrategy::ColumnSemantic,
                seq,
                content,
                window[0].index,
                window[window.len() - 1].index,
            )
            .with_meta("column_group", json!(group))
            .with_meta("columns", json!(columns));
            chunks.push(chunk);
            seq += 1;
        }
    }

    // Co-membership lives in metadata; this strategy emits no edges.
    ChunkOutput {
        chunks,
        relations: Vec::new(),
    }
}

/// Render rows restricted to one column group, one line per row.
fn render_group(rows: &[Row], columns: &[String]) -> String {
    rows.iter()
        .map(|row| {
            let parts: Vec<String> = columns
                .iter()
                .filter_map(|column| row.cell(column).map(|v| format!("{}: {}", column, v)))
                .collect();
            parts.join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
