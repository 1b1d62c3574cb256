//! Embedding client for the hosted multilingual embedding API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, EmbeddingError};
use crate::models::EmbeddingConfig;

/// Text-to-vector capability used by ingestion and retrieval.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed chunks for storage.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Input type for embedding generation.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// For indexing documents
    SearchDocument,
    /// For search queries
    SearchQuery,
}

/// Request body for the /v1/embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: Vec<String>,
    model: &'a str,
    input_type: InputType,
    truncate: &'static str,
}

/// Response from the /v1/embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for the hosted embedding endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    batch_size: usize,
}

impl EmbeddingClient {
    /// Create a new embedding client; fails if the API key is empty.
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(crate::models::API_KEY_ENV.to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.trim().to_string(),
            batch_size: config.batch_size.max(1) as usize,
        })
    }

    /// Generate embeddings for a batch of texts with the given input type.
    async fn embed_with_type(
        &self,
        texts: Vec<String>,
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.embed_single_batch(chunk.to_vec(), input_type).await?;
            if embeddings.len() != chunk.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    chunk.len(),
                    embeddings.len()
                )));
            }
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    async fn embed_single_batch(
        &self,
        texts: Vec<String>,
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/v1/embed", self.base_url);
        let request = EmbedRequest {
            texts,
            model: &self.model,
            input_type,
            truncate: "END",
        };

        tracing::debug!(
            "Embedding {} texts with {} ({:?})",
            request.texts.len(),
            self.model,
            input_type
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(embed_response.embeddings)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed_with_type(texts, InputType::SearchDocument).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embeddings = self
            .embed_with_type(vec![text.to_string()], InputType::SearchQuery)
            .await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    /// Requests seen by the stub: authorization header and JSON body.
    type Recorded = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// One `[len, 1.0]` vector per text, in request order.
    async fn embed_stub(
        State(recorded): State<Recorded>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let embeddings: Vec<Vec<f32>> = body["texts"]
            .as_array()
            .map(|texts| {
                texts
                    .iter()
                    .map(|t| vec![t.as_str().unwrap_or_default().len() as f32, 1.0])
                    .collect()
            })
            .unwrap_or_default();
        recorded.lock().unwrap().push((auth, body));
        Json(json!({ "embeddings": embeddings }))
    }

    async fn spawn_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_embed_stub() -> (String, Recorded) {
        let recorded = Recorded::default();
        let app = Router::new()
            .route("/v1/embed", post(embed_stub))
            .with_state(recorded.clone());
        (spawn_stub(app).await, recorded)
    }

    fn client_for(base_url: &str, batch_size: u32) -> EmbeddingClient {
        let config = EmbeddingConfig {
            url: base_url.to_string(),
            batch_size,
            ..Default::default()
        };
        let mut client = EmbeddingClient::new(&config, "test-key").unwrap();
        client.client = Client::builder().no_proxy().build().unwrap();
        client
    }

    #[test]
    fn test_client_creation() {
        let config = EmbeddingConfig::default();
        let client = EmbeddingClient::new(&config, "test-key");
        assert!(client.is_ok());
    }

    #[test]
    fn test_missing_api_key_fails_at_construction() {
        let config = EmbeddingConfig::default();
        let result = EmbeddingClient::new(&config, "  ");
        assert!(matches!(result, Err(ConfigError::MissingApiKey(_))));
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: "https://api.cohere.com/".to_string(),
            ..Default::default()
        };
        let client = EmbeddingClient::new(&config, "key").unwrap();
        assert_eq!(client.base_url(), "https://api.cohere.com");
        assert_eq!(client.model(), "embed-multilingual-v3.0");
    }

    #[test]
    fn test_request_serialization() {
        let request = EmbedRequest {
            texts: vec!["a".to_string()],
            model: "embed-multilingual-v3.0",
            input_type: InputType::SearchQuery,
            truncate: "END",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input_type"], "search_query");
        assert_eq!(json["texts"][0], "a");
        assert_eq!(json["truncate"], "END");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let config = EmbeddingConfig {
            url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let client = EmbeddingClient::new(&config, "key").unwrap();
        let embeddings = client.embed_documents(Vec::new()).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn test_embed_documents_splits_batches() {
        let (base, recorded) = spawn_embed_stub().await;
        let client = client_for(&base, 2);

        let texts: Vec<String> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let embeddings = client.embed_documents(texts).await.unwrap();

        let lengths: Vec<f32> = embeddings.iter().map(|e| e[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let requests = recorded.lock().unwrap();
        let sizes: Vec<usize> = requests
            .iter()
            .map(|(_, body)| body["texts"].as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        for (auth, body) in requests.iter() {
            assert_eq!(auth.as_deref(), Some("Bearer test-key"));
            assert_eq!(body["model"], "embed-multilingual-v3.0");
            assert_eq!(body["input_type"], "search_document");
            assert_eq!(body["truncate"], "END");
        }
        assert_eq!(requests[2].1["texts"][0], "eeeee");
    }

    #[tokio::test]
    async fn test_embed_query_uses_query_input_type() {
        let (base, recorded) = spawn_embed_stub().await;
        let client = client_for(&base, 96);

        let embedding = client.embed_query("hello").await.unwrap();
        assert_eq!(embedding, vec![5.0, 1.0]);

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1["input_type"], "search_query");
        assert_eq!(requests[0].1["texts"], json!(["hello"]));
    }

    #[tokio::test]
    async fn test_non_success_status_is_server_error() {
        let app = Router::new().route(
            "/v1/embed",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let base = spawn_stub(app).await;
        let client = client_for(&base, 96);

        match client.embed_documents(vec!["a".to_string()]).await {
            Err(EmbeddingError::ServerError(message)) => {
                assert!(message.contains("429"));
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch_is_rejected() {
        let app = Router::new().route(
            "/v1/embed",
            post(|| async { Json(json!({ "embeddings": [[0.5, 0.5]] })) }),
        );
        let base = spawn_stub(app).await;
        let client = client_for(&base, 96);

        let result = client
            .embed_documents(vec!["a".to_string(), "b".to_string()])
            .await;
        assert!(matches!(result, Err(EmbeddingError::InvalidResponse(_))));
    }
}
