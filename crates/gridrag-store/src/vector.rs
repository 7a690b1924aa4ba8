//! SQLite-backed vector store.
//!
//! Brute-force cosine similarity over per-collection namespaces. Writes are
//! keyed upserts, so concurrent writers converge without explicit locking
//! beyond the connection mutex.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};
use ulid::Ulid;

use gridrag_core::{
    Chunk, ChunkStrategy, RagError, Result, SearchFilters, VectorStore,
};

use crate::schema::VECTOR_SCHEMA;

/// SQLite vector store adapter.
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVectorStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| RagError::database(format!("failed to open vector store: {}", e)))?;

        Self::init(conn, path)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RagError::database(format!("failed to open in-memory store: {}", e)))?;
        Self::init(conn, Path::new(":memory:"))
    }

    fn init(conn: Connection, path: &Path) -> Result<Self> {
        configure_connection(&conn)?;
        conn.execute_batch(VECTOR_SCHEMA)
            .map_err(|e| RagError::database(format!("failed to initialize schema: {}", e)))?;

        info!("vector store opened at {:?}", path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RagError::internal("vector store lock poisoned"))
    }
}

/// Shared pragmas for both store adapters.
pub(crate) fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 30000;
        PRAGMA temp_store = MEMORY;
        "#,
    )
    .map_err(|e| RagError::database(format!("failed to configure connection: {}", e)))?;
    Ok(())
}

/// Encode an embedding as little-endian f32 bytes.
pub(crate) fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for x in embedding {
        blob.extend_from_slice(&x.to_le_bytes());
    }
    blob
}

/// Decode little-endian f32 bytes back into an embedding.
pub(crate) fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
    let id: String = row.get("id")?;
    let doc_id: String = row.get("doc_id")?;
    let seq_index: u32 = row.get("seq_index")?;
    let content: String = row.get("content")?;
    let strategy: String = row.get("strategy")?;
    let row_start: u32 = row.get("row_start")?;
    let row_end: u32 = row.get("row_end")?;
    let metadata: String = row.get("metadata")?;
    let embedding: Option<Vec<u8>> = row.get("embedding")?;

    Ok(Chunk {
        id,
        doc_id: doc_id.parse::<Ulid>().unwrap_or_default(),
        seq_index,
        content,
        strategy: ChunkStrategy::from_tag(&strategy).unwrap_or(ChunkStrategy::RowBased),
        row_start,
        row_end,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        embedding: embedding.as_deref().map(blob_to_embedding),
    })
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert_chunks(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RagError::database(format!("failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO chunks
                     (collection, id, doc_id, seq_index, content, strategy,
                      row_start, row_end, metadata, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            for chunk in chunks {
                let embedding = chunk
                    .embedding
                    .as_ref()
                    .ok_or_else(|| {
                        RagError::internal(format!("chunk {} has no embedding", chunk.id))
                    })?;
                let metadata = serde_json::to_string(&chunk.metadata)?;
                stmt.execute(params![
                    collection,
                    chunk.id,
                    chunk.doc_id.to_string(),
                    chunk.seq_index,
                    chunk.content,
                    chunk.strategy.tag(),
                    chunk.row_start,
                    chunk.row_end,
                    metadata,
                    embedding_to_blob(embedding),
                ])
                .map_err(|e| RagError::database(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| RagError::database(format!("failed to commit upsert: {}", e)))?;
        debug!(collection, count = chunks.len(), "upserted chunks");
        Ok(())
    }

    async fn delete_chunks(&self, collection: &str, chunk_ids: &[String]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RagError::database(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare("DELETE FROM chunks WHERE collection = ?1 AND id = ?2")
                .map_err(|e| RagError::database(e.to_string()))?;
            for id in chunk_ids {
                stmt.execute(params![collection, id])
                    .map_err(|e| RagError::database(e.to_string()))?;
            }
        }
        tx.commit()
            .map_err(|e| RagError::database(e.to_string()))?;
        Ok(())
    }

    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: u32,
        filters: &SearchFilters,
    ) -> Result<Vec<(String, f32)>> {
        let conn = self.lock()?;

        let mut sql = String::from(
            "SELECT id, embedding FROM chunks WHERE collection = ?1 AND embedding IS NOT NULL",
        );
        let mut bind: Vec<String> = vec![collection.to_string()];
        if let Some(doc_id) = filters.document_id {
            bind.push(doc_id.to_string());
            sql.push_str(&format!(" AND doc_id = ?{}", bind.len()));
        }
        if let Some(strategy) = filters.strategy {
            bind.push(strategy.tag().to_string());
            sql.push_str(&format!(" AND strategy = ?{}", bind.len()));
        }

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| RagError::database(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(bind.iter()), |row| {
                let id: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, blob))
            })
            .map_err(|e| RagError::database(e.to_string()))?;

        let mut scored: Vec<(String, f32)> = Vec::new();
        for row in rows {
            let (id, blob) = row.map_err(|e| RagError::database(e.to_string()))?;
            let candidate = blob_to_embedding(&blob);
            scored.push((id, cosine_similarity(embedding, &candidate)));
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k as usize);
        Ok(scored)
    }

    async fn existing_ids(&self, collection: &str, ids: &[String]) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT 1 FROM chunks WHERE collection = ?1 AND id = ?2")
            .map_err(|e| RagError::database(e.to_string()))?;

        let mut found = HashSet::new();
        for id in ids {
            let exists: Option<i64> = stmt
                .query_row(params![collection, id], |row| row.get(0))
                .optional()
                .map_err(|e| RagError::database(e.to_string()))?;
            if exists.is_some() {
                found.insert(id.clone());
            }
        }
        Ok(found)
    }

    async fn fetch_chunks(&self, collection: &str, ids: &[String]) -> Result<Vec<Chunk>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, doc_id, seq_index, content, strategy, row_start, row_end,
                        metadata, embedding
                 FROM chunks WHERE collection = ?1 AND id = ?2",
            )
            .map_err(|e| RagError::database(e.to_string()))?;

        let mut chunks = Vec::with_capacity(ids.len());
        for id in ids {
            let chunk = stmt
                .query_row(params![collection, id], row_to_chunk)
                .optional()
                .map_err(|e| RagError::database(e.to_string()))?;
            if let Some(chunk) = chunk {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    async fn chunk_ids_for_document(
        &self,
        collection: &str,
        doc_id: Ulid,
    ) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id FROM chunks WHERE collection = ?1 AND doc_id = ?2 ORDER BY seq_index",
            )
            .map_err(|e| RagError::database(e.to_string()))?;
        let rows = stmt
            .query_map(params![collection, doc_id.to_string()], |row| row.get(0))
            .map_err(|e| RagError::database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(|e| RagError::database(e.to_string()))
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| RagError::store_unavailable("vector", e.to_string()))
    }
}
