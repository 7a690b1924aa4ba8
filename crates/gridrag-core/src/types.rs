//! Core domain types for the retrieval engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Chunking strategy tags. Closed set: adding a strategy is a compile-time
/// change, dispatched through [`crate::traits`] consumers, never a string
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    RowBased,
    SlidingWindow,
    Hierarchical,
    ColumnSemantic,
    EntityCentric,
    TopicClustering,
    AdaptiveSmart,
}

impl ChunkStrategy {
    /// Stable string tag used in chunk ids and store rows.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RowBased => "row_based",
            Self::SlidingWindow => "sliding_window",
            Self::Hierarchical => "hierarchical",
            Self::ColumnSemantic => "column_semantic",
            Self::EntityCentric => "entity_centric",
            Self::TopicClustering => "topic_clustering",
            Self::AdaptiveSmart => "adaptive_smart",
        }
    }

    /// Parse a strategy tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "row_based" => Some(Self::RowBased),
            "sliding_window" => Some(Self::SlidingWindow),
            "hierarchical" => Some(Self::Hierarchical),
            "column_semantic" => Some(Self::ColumnSemantic),
            "entity_centric" => Some(Self::EntityCentric),
            "topic_clustering" => Some(Self::TopicClustering),
            "adaptive_smart" => Some(Self::AdaptiveSmart),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single row of a structured document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// 0-based position within the document.
    pub index: u32,

    /// Column name to cell value.
    pub values: HashMap<String, String>,
}

impl Row {
    /// Create a row from (column, value) pairs.
    pub fn new(index: u32, values: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            index,
            values: values.into_iter().collect(),
        }
    }

    /// Cell value for a column, if present and non-empty.
    pub fn cell(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// A structured document: ordered rows with named columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (ULID).
    pub id: Ulid,

    /// Owning department (human-readable name; slugged before hitting stores).
    pub collection: String,

    /// Display name of the source sheet/file.
    pub name: String,

    /// Column order for deterministic rendering.
    pub columns: Vec<String>,

    /// Ordered rows.
    pub rows: Vec<Row>,
}

impl Document {
    /// Create a new document with a fresh ULID.
    pub fn new(collection: &str, name: &str, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            id: Ulid::new(),
            collection: collection.to_string(),
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// Render a single row as "column: value" pairs in column order.
    pub fn render_row(&self, row: &Row) -> String {
        let mut parts = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if let Some(value) = row.cell(column) {
                parts.push(format!("{}: {}", column, value));
            }
        }
        parts.join(" | ")
    }

    /// Render a span of rows, one line per row.
    pub fn render_rows(&self, rows: &[&Row]) -> String {
        rows.iter()
            .map(|r| self.render_row(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A retrievable unit of text produced by a chunking strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic id: `{doc_id}:{strategy_tag}:{seq:04}`.
    pub id: String,

    /// Parent document ID.
    pub doc_id: Ulid,

    /// Emission order within the document (0-based).
    pub seq_index: u32,

    /// Chunk text payload.
    pub content: String,

    /// Strategy that produced this chunk.
    pub strategy: ChunkStrategy,

    /// First source row covered (0-based).
    pub row_start: u32,

    /// Last source row covered (0-based, inclusive).
    pub row_end: u32,

    /// Strategy-specific metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Embedding vector, populated by the vector indexer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Create a new chunk with a derived id.
    pub fn new(
        doc_id: Ulid,
        strategy: ChunkStrategy,
        seq_index: u32,
        content: String,
        row_start: u32,
        row_end: u32,
    ) -> Self {
        Self {
            id: Self::derive_id(doc_id, strategy, seq_index),
            doc_id,
            seq_index,
            content,
            strategy,
            row_start,
            row_end,
            metadata: HashMap::new(),
            embedding: None,
        }
    }

    /// Deterministic chunk id. Same document + strategy + position always
    /// yields the same id, so re-ingestion overwrites instead of duplicating.
    pub fn derive_id(doc_id: Ulid, strategy: ChunkStrategy, seq_index: u32) -> String {
        format!("{}:{}:{:04}", doc_id, strategy.tag(), seq_index)
    }

    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Typed relation vocabulary between chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Sequential,
    Overlap,
    Hierarchical,
    Sibling,
    EntityShared,
    Similarity,
}

impl RelationKind {
    /// Stable string tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Overlap => "overlap",
            Self::Hierarchical => "hierarchical",
            Self::Sibling => "sibling",
            Self::EntityShared => "entity_shared",
            Self::Similarity => "similarity",
        }
    }

    /// Parse a relation tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequential" => Some(Self::Sequential),
            "overlap" => Some(Self::Overlap),
            "hierarchical" => Some(Self::Hierarchical),
            "sibling" => Some(Self::Sibling),
            "entity_shared" => Some(Self::EntityShared),
            "similarity" => Some(Self::Similarity),
            _ => None,
        }
    }

    /// Whether edges of this kind are directed.
    pub fn is_directed(&self) -> bool {
        matches!(self, Self::Sequential | Self::Hierarchical)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A typed, weighted edge between two chunks.
///
/// Identity is `(source_id, target_id, kind)`; upserts with the same key
/// overwrite strength and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    /// Derived id: `{source}>{target}#{kind}`.
    pub id: String,

    /// Source chunk id.
    pub source_id: String,

    /// Target chunk id.
    pub target_id: String,

    /// Relation type.
    pub kind: RelationKind,

    /// Edge strength in [0, 1].
    pub strength: f32,

    /// Edge metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Relation {
    /// Create a relation; strength is clamped into [0, 1].
    pub fn new(source_id: &str, target_id: &str, kind: RelationKind, strength: f32) -> Self {
        Self {
            id: format!("{}>{}#{}", source_id, target_id, kind.tag()),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            kind,
            strength: strength.clamp(0.0, 1.0),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Output of a chunking run: ordered chunks plus the relations among them.
#[derive(Debug, Clone, Default)]
pub struct ChunkOutput {
    pub chunks: Vec<Chunk>,
    pub relations: Vec<Relation>,
}

/// A candidate after score fusion. Missing per-source scores are typed as
/// `None`, never absent keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedCandidate {
    /// Chunk id.
    pub chunk_id: String,

    /// Raw vector similarity score, if the vector source returned this chunk.
    pub vector_score: Option<f32>,

    /// Raw graph relevance score, if the graph source returned this chunk.
    pub graph_score: Option<f32>,

    /// Combined score.
    pub fused_score: f32,
}

/// A ranked search hit with its chunk payload attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result rank (1-indexed).
    pub rank: u32,

    /// Chunk id.
    pub chunk_id: String,

    /// Raw vector similarity score.
    pub vector_score: Option<f32>,

    /// Raw graph relevance score.
    pub graph_score: Option<f32>,

    /// Fused score used for ordering.
    pub fused_score: f32,

    /// The matched chunk.
    pub chunk: Chunk,
}

/// Search response container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The original query.
    pub query: String,

    /// True when one retrieval source was unavailable and results came from
    /// the other alone.
    pub degraded: bool,

    /// Search latency in milliseconds.
    pub latency_ms: u64,

    /// Ranked results.
    pub results: Vec<SearchHit>,
}

/// Per-store reachability, consumed by degraded-mode logic and operators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthStatus {
    pub vector_ok: bool,
    pub graph_ok: bool,
}

impl HealthStatus {
    /// At least one source can answer queries.
    pub fn can_search(&self) -> bool {
        self.vector_ok || self.graph_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_rows(n: u32) -> Document {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = (0..n)
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

    #[test]
    fn test_strategy_tag_round_trip() {
        for s in [
            ChunkStrategy::RowBased,
            ChunkStrategy::SlidingWindow,
            ChunkStrategy::Hierarchical,
            ChunkStrategy::ColumnSemantic,
            ChunkStrategy::EntityCentric,
            ChunkStrategy::TopicClustering,
            ChunkStrategy::AdaptiveSmart,
        ] {
            assert_eq!(ChunkStrategy::from_tag(s.tag()), Some(s));
        }
        assert_eq!(ChunkStrategy::from_tag("bogus"), None);
    }

    #[test]
    fn test_chunk_id_is_deterministic() {
        let doc = doc_with_rows(3);
        let a = Chunk::derive_id(doc.id, ChunkStrategy::RowBased, 2);
        let b = Chunk::derive_id(doc.id, ChunkStrategy::RowBased, 2);
        assert_eq!(a, b);
        assert!(a.ends_with(":row_based:0002"));
    }

    #[test]
    fn test_render_row_follows_column_order() {
        let doc = doc_with_rows(1);
        let text = doc.render_row(&doc.rows[0]);
        assert_eq!(text, "id: R0 | name: row 0");
    }

    #[test]
    fn test_render_row_skips_empty_cells() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let row = Row::new(
            0,
            vec![
                ("a".to_string(), "x".to_string()),
                ("b".to_string(), "  ".to_string()),
            ],
        );
        let doc = Document::new("ops", "sheet", columns, vec![row]);
        assert_eq!(doc.render_row(&doc.rows[0]), "a: x");
    }

    #[test]
    fn test_relation_strength_clamped() {
        let r = Relation::new("a", "b", RelationKind::Sequential, 1.7);
        assert_eq!(r.strength, 1.0);
        let r = Relation::new("a", "b", RelationKind::Overlap, -0.2);
        assert_eq!(r.strength, 0.0);
    }

    #[test]
    fn test_relation_id_encodes_key() {
        let r = Relation::new("a", "b", RelationKind::Sibling, 0.5);
        assert_eq!(r.id, "a>b#sibling");
    }
}
