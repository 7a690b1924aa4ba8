//! Shared fixtures for strategy tests.

use gridrag_core::{Chunk, Document, Row};

/// Two-column document with unique ids: `id: R<i> | name: row <i>`.
pub(crate) fn numbered_doc(rows: u32) -> Document {
    let columns = vec!["id".to_string(), "name".to_string()];
    let rows = (0..rows)
        .map(|i| {
            Row::new(
                i,
                vec![
                    ("id".to_string(), format!("R{}", i)),
                    ("name".to_string(), format!("row {}", i)),
                ],
            )
        })
        .collect();
    Document::new("engineering", "roster", columns, rows)
}

/// Document with a `category` column; `sections` lists (label, row count).
pub(crate) fn sectioned_doc(sections: &[(&str, u32)]) -> Document {
    let columns = vec![
        "category".to_string(),
        "item".to_string(),
        "detail".to_string(),
    ];
    let mut rows = Vec::new();
    let mut index = 0u32;
    for (label, count) in sections {
        for i in 0..*count {
            rows.push(Row::new(
                index,
                vec![
                    ("category".to_string(), label.to_string()),
                    ("item".to_string(), format!("{}-{}", label, i)),
                    ("detail".to_string(), format!("details for {} {}", label, i)),
                ],
            ));
            index += 1;
        }
    }
    Document::new("operations", "inventory", columns, rows)
}

/// Task sheet: task_id / title / status / owner_notes.
pub(crate) fn task_doc(rows: u32) -> Document {
    let columns = vec![
        "task_id".to_string(),
        "title".to_string(),
        "status".to_string(),
        "owner_notes".to_string(),
    ];
    let rows = (0..rows)
        .map(|i| {
            Row::new(
                i,
                vec![
                    ("task_id".to_string(), format!("T-{}", i)),
                    ("title".to_string(), format!("task number {}", i)),
                    (
                        "status".to_string(),
                        if i % 2 == 0 { "open" } else { "done" }.to_string(),
                    ),
                    ("owner_notes".to_string(), format!("notes {}", i)),
                ],
            )
        })
        .collect();
    Document::new("planning", "tasks", columns, rows)
}

/// Owner/project sheet for entity tests.
pub(crate) fn owner_doc(rows: &[(&str, &str)]) -> Document {
    let columns = vec!["owner_id".to_string(), "project".to_string()];
    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, (owner, project))| {
            Row::new(
                i as u32,
                vec![
                    ("owner_id".to_string(), owner.to_string()),
                    ("project".to_string(), project.to_string()),
                ],
            )
        })
        .collect();
    Document::new("staffing", "assignments", columns, rows)
}

/// Two clearly separated vocabularies, for clustering tests.
pub(crate) fn themed_doc() -> Document {
    let columns = vec!["topic".to_string(), "text".to_string()];
    let mut rows = Vec::new();
    for i in 0..6u32 {
        rows.push(Row::new(
            i,
            vec![
                ("topic".to_string(), "budget".to_string()),
                (
                    "text".to_string(),
                    format!("budget finance invoice payment ledger {}", i),
                ),
            ],
        ));
    }
    for i in 6..12u32 {
        rows.push(Row::new(
            i,
            vec![
                ("topic".to_string(), "hiring".to_string()),
                (
                    "text".to_string(),
                    format!("hiring interview candidate recruiter offer {}", i),
                ),
            ],
        ));
    }
    Document::new("finance", "mixed", columns, rows)
}

/// Wide sheet with `cols` anonymous field columns.
pub(crate) fn wide_doc(rows: u32, cols: u32) -> Document {
    let columns: Vec<String> = (0..cols).map(|c| format!("field_{}", c)).collect();
    let rows = (0..rows)
        .map(|i| {
            Row::new(
                i,
                columns
                    .iter()
                    .map(|c| (c.clone(), format!("{} value {}", c, i)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    Document::new("records", "wide", columns, rows)
}

/// Plain document whose column names match no classification rule.
pub(crate) fn plain_doc(rows: u32, cols: u32) -> Document {
    let names = ["alpha", "beta", "gamma", "delta", "epsilon"];
    let columns: Vec<String> = (0..cols as usize)
        .map(|c| names[c % names.len()].to_string())
        .collect();
    let rows = (0..rows)
        .map(|i| {
            Row::new(
                i,
                columns
                    .iter()
                    .map(|c| (c.clone(), format!("{} {}", c, i)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    Document::new("misc", "plain", columns, rows)
}

/// Every input row must fall inside at least one chunk's row span.
pub(crate) fn assert_rows_covered(doc: &Document, chunks: &[Chunk]) {
    for row in &doc.rows {
        let covered = chunks
            .iter()
            .any(|c| c.row_start <= row.index && row.index <= c.row_end);
        assert!(covered, "row {} not covered by any chunk", row.index);
    }
}
