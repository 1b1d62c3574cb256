//! Vector store abstraction layer.
//!
//! The default backend keeps an HNSW index and a SQLite record file inside a
//! local directory; a Qdrant server can be selected through configuration
//! instead.

mod local;
mod qdrant;

pub use local::LocalBackend;
pub use qdrant::QdrantBackend;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{DocumentChunk, EmbeddingConfig, RetrievedChunk, VectorDriver, VectorStoreConfig};

/// Collection information
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
}

/// Persistence and similarity search for embedded chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is healthy and accessible.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Returns None if the collection doesn't exist.
    async fn get_collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create the collection if it doesn't exist.
    async fn create_collection(&self) -> Result<(), VectorStoreError>;

    /// Insert or replace chunks; each must carry its embedding.
    async fn upsert_points(&self, chunks: Vec<DocumentChunk>) -> Result<(), VectorStoreError>;

    /// Top `limit` records by cosine similarity, best first.
    async fn search(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError>;

    /// Remove every record from the collection.
    async fn clear_collection(&self) -> Result<(), VectorStoreError>;

    fn collection(&self) -> &str;
}

/// Create the configured backend for the given embedding dimension.
pub async fn create_backend(
    config: &VectorStoreConfig,
    embedding_dim: u64,
) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    match config.driver {
        VectorDriver::Local => {
            let backend = LocalBackend::open(&config.path, &config.collection, embedding_dim)?;
            Ok(Box::new(backend))
        }
        VectorDriver::Qdrant => {
            let backend = QdrantBackend::new(config, embedding_dim)?;
            Ok(Box::new(backend))
        }
    }
}

/// Create a backend sized from the embedding configuration.
pub async fn create_backend_with_embedding_config(
    vector_config: &VectorStoreConfig,
    embedding_config: &EmbeddingConfig,
) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    create_backend(vector_config, u64::from(embedding_config.dimension)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = VectorStoreConfig {
            path: dir.path().join("store"),
            ..Default::default()
        };
        let store = create_backend(&config, 4).await.unwrap();
        assert_eq!(store.collection(), "documents");
        assert!(store.health_check().await.unwrap());
    }
}
