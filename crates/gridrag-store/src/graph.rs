//! SQLite-backed graph store.
//!
//! Relations are edges keyed by (collection, source, target, kind).
//! Expansion walks outward from seed chunks breadth-first; each discovered
//! chunk scores as edge strength divided by hop distance, max-merged when
//! several paths reach it.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use gridrag_core::{GraphStore, RagError, Relation, Result};

use crate::schema::GRAPH_SCHEMA;
use crate::vector::configure_connection;

/// SQLite graph store adapter.
pub struct SqliteGraphStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGraphStore {
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
        .map_err(|e| RagError::database(format!("failed to open graph store: {}", e)))?;

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
        conn.execute_batch(GRAPH_SCHEMA)
            .map_err(|e| RagError::database(format!("failed to initialize schema: {}", e)))?;

        info!("graph store opened at {:?}", path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RagError::internal("graph store lock poisoned"))
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn upsert_relations(&self, collection: &str, relations: &[Relation]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RagError::database(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO relations
                     (collection, source_id, target_id, kind, strength, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            for relation in relations {
                let metadata = serde_json::to_string(&relation.metadata)?;
                stmt.execute(params![
                    collection,
                    relation.source_id,
                    relation.target_id,
                    relation.kind.tag(),
                    relation.strength,
                    metadata,
                ])
                .map_err(|e| RagError::database(e.to_string()))?;
            }
        }
        tx.commit()
            .map_err(|e| RagError::database(e.to_string()))?;
        debug!(collection, count = relations.len(), "upserted relations");
        Ok(())
    }

    async fn expand(
        &self,
        collection: &str,
        seeds: &[String],
        depth: u8,
    ) -> Result<Vec<(String, f32)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT source_id, target_id, strength FROM relations
                 WHERE collection = ?1 AND (source_id = ?2 OR target_id = ?2)",
            )
            .map_err(|e| RagError::database(e.to_string()))?;

        let seed_set: HashSet<&str> = seeds.iter().map(String::as_str).collect();
        let mut visited: HashSet<String> = seeds.iter().cloned().collect();
        let mut frontier: Vec<String> = seeds.to_vec();
        let mut best: HashMap<String, f32> = HashMap::new();

        for hop in 1..=depth.max(1) as u32 {
            let mut next = Vec::new();

            for node in &frontier {
                let edges = stmt
                    .query_map(params![collection, node], |row| {
                        let source: String = row.get(0)?;
                        let target: String = row.get(1)?;
                        let strength: f32 = row.get(2)?;
                        Ok((source, target, strength))
                    })
                    .map_err(|e| RagError::database(e.to_string()))?;

                for edge in edges {
                    let (source, target, strength) =
                        edge.map_err(|e| RagError::database(e.to_string()))?;
                    // Traversal is undirected even for directed kinds.
                    let neighbor = if &source == node { target } else { source };

                    if !seed_set.contains(neighbor.as_str()) {
                        let score = strength / hop as f32;
                        let entry = best.entry(neighbor.clone()).or_insert(score);
                        if score > *entry {
                            *entry = score;
                        }
                    }
                    if visited.insert(neighbor.clone()) {
                        next.push(neighbor);
                    }
                }
            }

            frontier = next;
            if frontier.is_empty() {
                break;
            }
        }

        let mut scored: Vec<(String, f32)> = best.into_iter().collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(scored)
    }

    async fn delete_relations_touching(
        &self,
        collection: &str,
        chunk_ids: &[String],
    ) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RagError::database(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare(
                    "DELETE FROM relations
                     WHERE collection = ?1 AND (source_id = ?2 OR target_id = ?2)",
                )
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

    async fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| RagError::store_unavailable("graph", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridrag_core::RelationKind;

    fn relation(source: &str, target: &str, strength: f32) -> Relation {
        Relation::new(source, target, RelationKind::Sequential, strength)
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_key() {
        let store = SqliteGraphStore::open_memory().unwrap();
        store
            .upsert_relations("eng", &[relation("a", "b", 0.4)])
            .await
            .unwrap();
        store
            .upsert_relations("eng", &[relation("a", "b", 0.9)])
            .await
            .unwrap();

        let expanded = store
            .expand("eng", &["a".to_string()], 1)
            .await
            .unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].0, "b");
        assert!((expanded[0].1 - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_expand_single_hop() {
        let store = SqliteGraphStore::open_memory().unwrap();
        store
            .upsert_relations(
                "eng",
                &[relation("a", "b", 1.0), relation("b", "c", 0.8)],
            )
            .await
            .unwrap();

        let expanded = store.expand("eng", &["a".to_string()], 1).await.unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].0, "b");
    }

    #[tokio::test]
    async fn test_expand_two_hops_divides_by_distance() {
        let store = SqliteGraphStore::open_memory().unwrap();
        store
            .upsert_relations(
                "eng",
                &[relation("a", "b", 1.0), relation("b", "c", 0.8)],
            )
            .await
            .unwrap();

        let expanded = store.expand("eng", &["a".to_string()], 2).await.unwrap();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].0, "b");
        assert!((expanded[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(expanded[1].0, "c");
        // strength 0.8 at hop 2.
        assert!((expanded[1].1 - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_expand_is_undirected() {
        let store = SqliteGraphStore::open_memory().unwrap();
        store
            .upsert_relations("eng", &[relation("a", "b", 1.0)])
            .await
            .unwrap();

        let expanded = store.expand("eng", &["b".to_string()], 1).await.unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].0, "a");
    }

    #[tokio::test]
    async fn test_expand_excludes_seeds() {
        let store = SqliteGraphStore::open_memory().unwrap();
        store
            .upsert_relations(
                "eng",
                &[relation("a", "b", 1.0), relation("b", "a", 0.5)],
            )
            .await
            .unwrap();

        let expanded = store
            .expand("eng", &["a".to_string(), "b".to_string()], 2)
            .await
            .unwrap();
        assert!(expanded.is_empty());
    }

    #[tokio::test]
    async fn test_delete_relations_touching() {
        let store = SqliteGraphStore::open_memory().unwrap();
        store
            .upsert_relations(
                "eng",
                &[relation("a", "b", 1.0), relation("c", "d", 1.0)],
            )
            .await
            .unwrap();

        store
            .delete_relations_touching("eng", &["b".to_string()])
            .await
            .unwrap();

        assert!(store.expand("eng", &["a".to_string()], 1).await.unwrap().is_empty());
        assert_eq!(
            store.expand("eng", &["c".to_string()], 1).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = SqliteGraphStore::open_memory().unwrap();
        store
            .upsert_relations("eng", &[relation("a", "b", 1.0)])
            .await
            .unwrap();

        assert!(store.expand("sales", &["a".to_string()], 1).await.unwrap().is_empty());
    }
}
