//! Directory-backed vector store.
//!
//! Similarity search runs on a `ruvector-core` HNSW index kept under
//! `index/`. Chunk records and the collection manifest live in a SQLite
//! file next to it. SQLite is authoritative: the index is rebuilt from its
//! records the first time a process touches the collection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use ruvector_core::types::DbOptions;
use ruvector_core::{DistanceMetric, SearchQuery, VectorDB, VectorEntry};

use super::{CollectionInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{DocumentChunk, Metadata, RetrievedChunk};

pub const STORE_FILE: &str = "store.sqlite3";
const INDEX_DIR: &str = "index";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    dimension INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS embeddings (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL,
    vector BLOB NOT NULL,
    PRIMARY KEY (collection, id)
);
"#;

fn index_err(e: impl std::fmt::Display) -> VectorStoreError {
    VectorStoreError::Index(e.to_string())
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Synchronous half of the backend; every call blocks on disk.
struct LocalStore {
    conn: Mutex<Connection>,
    index: Mutex<Option<VectorDB>>,
    dir: PathBuf,
    collection: String,
    embedding_dim: u64,
}

impl LocalStore {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, VectorStoreError> {
        self.conn
            .lock()
            .map_err(|_| VectorStoreError::ConnectionError("store lock poisoned".to_string()))
    }

    fn index_path(&self) -> PathBuf {
        self.dir
            .join(INDEX_DIR)
            .join(format!("{}.redb", self.collection))
    }

    fn stored_dimension(&self, conn: &Connection) -> Result<Option<u64>, VectorStoreError> {
        let dimension = conn
            .query_row(
                "SELECT dimension FROM collections WHERE name = ?1",
                params![self.collection],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(dimension.map(|d| d as u64))
    }

    /// Fails when the collection was created for a different dimension.
    fn check_dimension(&self, conn: &Connection) -> Result<Option<u64>, VectorStoreError> {
        let stored = self.stored_dimension(conn)?;
        if let Some(dimension) = stored
            && dimension != self.embedding_dim
        {
            return Err(VectorStoreError::DimensionMismatch {
                expected: dimension as usize,
                actual: self.embedding_dim as usize,
            });
        }
        Ok(stored)
    }

    fn remove_index_file(&self) -> Result<(), VectorStoreError> {
        let path = self.index_path();
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match removed {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(
                VectorStoreError::DeleteError(format!("{}: {}", path.display(), e)),
            ),
            _ => Ok(()),
        }
    }

    /// Fresh index populated from every stored record.
    fn build_index(&self) -> Result<VectorDB, VectorStoreError> {
        self.remove_index_file()?;

        let path = self.index_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VectorStoreError::ConnectionError(format!("{}: {}", parent.display(), e))
            })?;
        }

        let mut options = DbOptions::default();
        options.dimensions = self.embedding_dim as usize;
        options.distance_metric = DistanceMetric::Cosine;
        options.storage_path = path.to_string_lossy().to_string();
        let db = VectorDB::new(options).map_err(index_err)?;

        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, vector FROM embeddings WHERE collection = ?1")?;
        let rows = stmt.query_map(params![self.collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut loaded = 0usize;
        for row in rows {
            let (id, bytes) = row?;
            let vector = decode_vector(&bytes);
            if vector.len() as u64 != self.embedding_dim {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: self.embedding_dim as usize,
                    actual: vector.len(),
                });
            }
            db.insert(VectorEntry {
                id: Some(id),
                vector,
                metadata: None,
            })
            .map_err(index_err)?;
            loaded += 1;
        }

        tracing::debug!("Indexed {} records of {}", loaded, self.collection);
        Ok(db)
    }

    /// Run `f` against the index, opening it on first use.
    fn with_index<T>(
        &self,
        f: impl FnOnce(&VectorDB) -> Result<T, VectorStoreError>,
    ) -> Result<T, VectorStoreError> {
        let mut guard = self
            .index
            .lock()
            .map_err(|_| VectorStoreError::ConnectionError("index lock poisoned".to_string()))?;

        if guard.is_none() {
            self.check_dimension(&*self.conn()?)?;
            *guard = Some(self.build_index()?);
        }

        match guard.as_ref() {
            Some(db) => f(db),
            None => Err(VectorStoreError::Index("index unavailable".to_string())),
        }
    }

    fn health_check(&self) -> Result<bool, VectorStoreError> {
        let conn = self.conn()?;
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(one == 1)
    }

    fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let conn = self.conn()?;
        if self.stored_dimension(&conn)?.is_none() {
            return Ok(None);
        }

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(Some(CollectionInfo {
            points_count: count as u64,
        }))
    }

    fn create_collection(&self) -> Result<(), VectorStoreError> {
        {
            let conn = self.conn()?;
            if self.check_dimension(&conn)?.is_none() {
                conn.execute(
                    "INSERT INTO collections (name, dimension) VALUES (?1, ?2)",
                    params![self.collection, self.embedding_dim as i64],
                )?;
            }
        }
        self.with_index(|_| Ok(()))
    }

    fn upsert(&self, chunks: &[DocumentChunk]) -> Result<(), VectorStoreError> {
        for chunk in chunks {
            if chunk.dense_vector.len() as u64 != self.embedding_dim {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: self.embedding_dim as usize,
                    actual: chunk.dense_vector.len(),
                });
            }
        }

        self.create_collection()?;

        self.with_index(|db| {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO embeddings (collection, id, content, metadata, vector)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for chunk in chunks {
                    let metadata = serde_json::to_string(&chunk.metadata.to_metadata())
                        .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;
                    stmt.execute(params![
                        self.collection,
                        chunk.id,
                        chunk.content,
                        metadata,
                        encode_vector(&chunk.dense_vector),
                    ])?;
                }
            }

            for chunk in chunks {
                db.delete(&chunk.id).map_err(index_err)?;
                db.insert(VectorEntry {
                    id: Some(chunk.id.clone()),
                    vector: chunk.dense_vector.clone(),
                    metadata: None,
                })
                .map_err(index_err)?;
            }

            tx.commit()?;
            Ok(())
        })?;

        tracing::debug!("Upserted {} chunks into {}", chunks.len(), self.collection);
        Ok(())
    }

    fn search(&self, query: Vec<f32>, limit: usize) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        if query.len() as u64 != self.embedding_dim {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.embedding_dim as usize,
                actual: query.len(),
            });
        }
        if self.check_dimension(&*self.conn()?)?.is_none() || limit == 0 {
            return Ok(Vec::new());
        }

        let hits = self.with_index(|db| {
            db.search(SearchQuery {
                vector: query,
                k: limit,
                filter: None,
                ef_search: None,
            })
            .map_err(index_err)
        })?;

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT content, metadata FROM embeddings WHERE collection = ?1 AND id = ?2",
        )?;

        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            if !seen.insert(hit.id.clone()) {
                continue;
            }
            let Some((content, metadata)) = stmt
                .query_row(params![self.collection, hit.id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .optional()?
            else {
                continue;
            };
            let metadata: Metadata = serde_json::from_str(&metadata)
                .map_err(|e| VectorStoreError::SearchError(format!("record {}: {}", hit.id, e)))?;

            // Cosine distance back to similarity.
            results.push(RetrievedChunk {
                id: hit.id,
                content,
                score: 1.0 - hit.score,
                metadata,
            });
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);
        Ok(results)
    }

    fn clear(&self) -> Result<(), VectorStoreError> {
        let mut guard = self
            .index
            .lock()
            .map_err(|_| VectorStoreError::ConnectionError("index lock poisoned".to_string()))?;
        *guard = None;
        self.remove_index_file()?;

        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM embeddings WHERE collection = ?1",
            params![self.collection],
        )
        .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;
        conn.execute(
            "DELETE FROM collections WHERE name = ?1",
            params![self.collection],
        )
        .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;
        Ok(())
    }
}

pub struct LocalBackend {
    store: Arc<LocalStore>,
    path: PathBuf,
    collection: String,
}

impl LocalBackend {
    /// Open (creating if needed) the store inside `dir`.
    ///
    /// A collection created for another dimension still opens, so that it
    /// can be inspected or cleared; reads and writes then fail with
    /// [`VectorStoreError::DimensionMismatch`].
    pub fn open(dir: &Path, collection: &str, embedding_dim: u64) -> Result<Self, VectorStoreError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            VectorStoreError::ConnectionError(format!("{}: {}", dir.display(), e))
        })?;

        let path = dir.join(STORE_FILE);
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;

        let store = LocalStore {
            conn: Mutex::new(conn),
            index: Mutex::new(None),
            dir: dir.to_path_buf(),
            collection: collection.to_string(),
            embedding_dim,
        };

        if let Err(e) = store.check_dimension(&*store.conn()?) {
            tracing::warn!("Collection {} in {}: {}", collection, dir.display(), e);
        }

        Ok(Self {
            store: Arc::new(store),
            path,
            collection: collection.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, VectorStoreError>
    where
        F: FnOnce(&LocalStore) -> Result<T, VectorStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| VectorStoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl VectorStore for LocalBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.blocking(|store| store.health_check()).await
    }

    async fn get_collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
        self.blocking(|store| store.collection_info()).await
    }

    async fn create_collection(&self) -> Result<(), VectorStoreError> {
        self.blocking(|store| store.create_collection()).await
    }

    async fn upsert_points(&self, chunks: Vec<DocumentChunk>) -> Result<(), VectorStoreError> {
        if chunks.is_empty() {
            return Ok(());
        }
        self.blocking(move |store| store.upsert(&chunks)).await
    }

    async fn search(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        self.blocking(move |store| store.search(query_vector, limit as usize))
            .await
    }

    async fn clear_collection(&self) -> Result<(), VectorStoreError> {
        self.blocking(|store| store.clear()).await
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, Language, SourceType, Topic};

    fn chunk(filename: &str, index: u32, vector: Vec<f32>) -> DocumentChunk {
        let mut chunk = DocumentChunk::new(
            format!("content of {filename} #{index}"),
            ChunkMetadata {
                filename: filename.to_string(),
                lang: Language::En,
                chunk_id: index,
                source_type: SourceType::Txt,
                topic: Topic::General,
                source: filename.to_string(),
                ingested_at: "2026-01-01T00:00:00+00:00".to_string(),
            },
        );
        chunk.dense_vector = vector;
        chunk
    }

    #[test]
    fn test_vector_encoding() {
        let vector = vec![0.5, -1.25, 3.0];
        assert_eq!(decode_vector(&encode_vector(&vector)), vector);
    }

    #[tokio::test]
    async fn test_missing_collection_has_no_info() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
        assert!(store.get_collection_info().await.unwrap().is_none());
        assert!(store.search(vec![1.0, 0.0], 5).await.unwrap().is_empty());
        store.create_collection().await.unwrap();
        let info = store.get_collection_info().await.unwrap().unwrap();
        assert_eq!(info.points_count, 0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
        store
            .upsert_points(vec![
                chunk("a.txt", 0, vec![1.0, 0.0]),
                chunk("b.txt", 0, vec![0.0, 1.0]),
                chunk("c.txt", 0, vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let results = store.search(vec![1.0, 0.1], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source(), Some("a.txt"));
        assert_eq!(results[1].source(), Some("c.txt"));
        assert!(results[0].score >= results[1].score);
        assert!(results[0].score > 0.9);
        assert_eq!(results[0].metadata["lang"], "en");
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
        store
            .upsert_points(vec![chunk("a.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert_points(vec![chunk("a.txt", 0, vec![0.0, 1.0])])
            .await
            .unwrap();
        let info = store.get_collection_info().await.unwrap().unwrap();
        assert_eq!(info.points_count, 1);

        let results = store.search(vec![0.0, 1.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
            store
                .upsert_points(vec![chunk("a.txt", 0, vec![1.0, 0.0])])
                .await
                .unwrap();
        }
        let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
        assert!(dir.path().join(STORE_FILE).exists());
        let info = store.get_collection_info().await.unwrap().unwrap();
        assert_eq!(info.points_count, 1);

        let results = store.search(vec![1.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source(), Some("a.txt"));
    }

    #[tokio::test]
    async fn test_chunk_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBackend::open(dir.path(), "docs", 3).unwrap();
        let result = store
            .upsert_points(vec![chunk("a.txt", 0, vec![1.0, 0.0])])
            .await;
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_reopen_with_other_dimension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
            store
                .upsert_points(vec![chunk("a.txt", 0, vec![1.0, 0.0])])
                .await
                .unwrap();
        }

        let store = LocalBackend::open(dir.path(), "docs", 3).unwrap();
        let search = store.search(vec![1.0, 0.0, 5.0], 5).await;
        assert!(matches!(
            search,
            Err(VectorStoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert!(matches!(
            store.create_collection().await,
            Err(VectorStoreError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            store
                .upsert_points(vec![chunk("b.txt", 0, vec![0.0, 1.0, 0.0])])
                .await,
            Err(VectorStoreError::DimensionMismatch { .. })
        ));

        // A reset lets the collection start over at the new dimension.
        store.clear_collection().await.unwrap();
        store
            .upsert_points(vec![chunk("b.txt", 0, vec![0.0, 1.0, 0.0])])
            .await
            .unwrap();
        let results = store.search(vec![0.0, 1.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source(), Some("b.txt"));
    }

    #[tokio::test]
    async fn test_stored_vector_of_wrong_length_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
            store
                .upsert_points(vec![chunk("a.txt", 0, vec![1.0, 0.0])])
                .await
                .unwrap();
        }
        {
            let conn = Connection::open(dir.path().join(STORE_FILE)).unwrap();
            conn.execute(
                "INSERT INTO embeddings (collection, id, content, metadata, vector)
                 VALUES ('docs', 'stray', 'x', '{}', ?1)",
                params![encode_vector(&[1.0, 0.0, 0.0])],
            )
            .unwrap();
        }

        let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
        let result = store.search(vec![1.0, 0.0], 5).await;
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[tokio::test]
    async fn test_clear_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBackend::open(dir.path(), "docs", 2).unwrap();
        store
            .upsert_points(vec![chunk("a.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        store.clear_collection().await.unwrap();
        assert!(store.get_collection_info().await.unwrap().is_none());
        assert!(store.search(vec![1.0, 0.0], 5).await.unwrap().is_empty());
    }
}
