//! Qdrant vector store backend implementation.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value, VectorParamsBuilder,
};
use std::collections::HashMap;

use super::{CollectionInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{DocumentChunk, Metadata, RetrievedChunk, VectorStoreConfig};

const CONTENT_KEY: &str = "content";

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    embedding_dim: u64,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig, embedding_dim: u64) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            embedding_dim,
        })
    }
}

/// Scalar JSON metadata to a Qdrant payload value; nested values are stored as JSON text.
fn to_payload_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::String(s) => s.into(),
        serde_json::Value::Bool(b) => b.into(),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        other => other.to_string().into(),
    }
}

fn from_payload_value(value: &Value) -> Option<serde_json::Value> {
    match value.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone().into()),
        Kind::IntegerValue(i) => Some((*i).into()),
        Kind::DoubleValue(d) => Some((*d).into()),
        Kind::BoolValue(b) => Some((*b).into()),
        _ => None,
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn get_collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => Ok(Some(CollectionInfo {
                points_count: info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
            })),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(None)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }

    async fn create_collection(&self) -> Result<(), VectorStoreError> {
        if self.get_collection_info().await?.is_some() {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(self.embedding_dim, Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn upsert_points(&self, chunks: Vec<DocumentChunk>) -> Result<(), VectorStoreError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = chunks
            .into_iter()
            .map(|chunk| {
                let mut payload: HashMap<String, Value> = chunk
                    .metadata
                    .to_metadata()
                    .into_iter()
                    .map(|(k, v)| (k, to_payload_value(v)))
                    .collect();
                payload.insert(CONTENT_KEY.to_string(), chunk.content.into());

                PointStruct::new(chunk.id, chunk.dense_vector, payload)
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(&self.collection, points).wait(true);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let search_builder =
            SearchPointsBuilder::new(&self.collection, query_vector, limit).with_payload(true);

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        let retrieved = results
            .result
            .into_iter()
            .map(|point| {
                let mut content = String::new();
                let mut metadata = Metadata::new();
                for (key, value) in &point.payload {
                    if key == CONTENT_KEY {
                        if let Some(Kind::StringValue(s)) = &value.kind {
                            content = s.clone();
                        }
                    } else if let Some(json) = from_payload_value(value) {
                        metadata.insert(key.clone(), json);
                    }
                }

                let id = match point.id.and_then(|id| id.point_id_options) {
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)) => uuid,
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)) => {
                        num.to_string()
                    }
                    None => String::new(),
                };

                RetrievedChunk {
                    id,
                    content,
                    score: point.score,
                    metadata,
                }
            })
            .collect();

        Ok(retrieved)
    }

    async fn clear_collection(&self) -> Result<(), VectorStoreError> {
        if self.get_collection_info().await?.is_none() {
            return Ok(());
        }

        self.client
            .delete_collection(&self.collection)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;

        self.create_collection().await
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_value_conversion() {
        let s = to_payload_value("a.pdf".into());
        assert_eq!(from_payload_value(&s), Some("a.pdf".into()));

        let i = to_payload_value(7.into());
        assert_eq!(from_payload_value(&i), Some(7.into()));

        let b = to_payload_value(true.into());
        assert_eq!(from_payload_value(&b), Some(true.into()));
    }

    #[test]
    fn test_backend_creation() {
        let backend = QdrantBackend::new(&VectorStoreConfig::default(), 1024).unwrap();
        assert_eq!(backend.collection(), "documents");
    }
}
