//! SQLite schemas for the two store adapters.

/// Vector store: one row per chunk, embedding as little-endian f32 BLOB.
pub const VECTOR_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    collection  TEXT NOT NULL,
    id          TEXT NOT NULL,
    doc_id      TEXT NOT NULL,
    seq_index   INTEGER NOT NULL,
    content     TEXT NOT NULL,
    strategy    TEXT NOT NULL,
    row_start   INTEGER NOT NULL,
    row_end     INTEGER NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}',
    embedding   BLOB,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_chunks_doc ON chunks (collection, doc_id);
"#;

/// Graph store: one row per edge, keyed by (collection, source, target, kind).
pub const GRAPH_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS relations (
    collection  TEXT NOT NULL,
    source_id   TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    kind        TEXT NOT NULL,
    strength    REAL NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (collection, source_id, target_id, kind)
);

CREATE INDEX IF NOT EXISTS idx_relations_source ON relations (collection, source_id);
CREATE INDEX IF NOT EXISTS idx_relations_target ON relations (collection, target_id);
"#;
