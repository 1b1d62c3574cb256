//! Similarity retrieval with guaranteed citation labels.

use std::sync::Arc;

use async_trait::async_trait;

use super::embedding::Embedder;
use super::vector_store::VectorStore;
use crate::error::SearchError;
use crate::models::RetrievedChunk;

/// Label used when a record carries neither `source` nor `filename`.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Ranked similarity search over stored chunks.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, SearchError>;
}

/// Embeds the query and searches the vector store.
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let results = self.store.search(query_vector, k as u64).await?;

        tracing::debug!("Retrieved {} chunks for query", results.len());
        Ok(results)
    }
}

/// Make sure a result has a `source` label, taken from `filename` when missing.
pub fn backfill_source(chunk: &mut RetrievedChunk) {
    if chunk.metadata.contains_key("source") {
        return;
    }
    let source = chunk
        .metadata_str("filename")
        .unwrap_or(UNKNOWN_SOURCE)
        .to_string();
    chunk.metadata.insert("source".to_string(), source.into());
}

/// Search through `retriever` and backfill the citation label of every result.
pub async fn retrieve_cited(
    retriever: &dyn Retriever,
    query: &str,
    k: usize,
) -> Result<Vec<RetrievedChunk>, SearchError> {
    let mut results = retriever.search(query, k).await?;
    results.iter_mut().for_each(backfill_source);
    Ok(results)
}
