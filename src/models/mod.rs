mod answer;
mod config;
mod document;
mod search;

pub use answer::{Answer, FeedbackRecord, MAX_TRUST_SCORE, Rating, trust_score};
pub use config::{
    API_KEY_ENV, Config, DEFAULT_CHAT_MODEL, DEFAULT_COLLECTION, DEFAULT_EMBEDDING_DIMENSION,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_FEEDBACK_LOG, DEFAULT_QDRANT_URL, DEFAULT_STORE_PATH,
    DatasetPaths, EmbeddingConfig, GenerationConfig, IngestConfig, OutputConfig,
    RetrievalConfig, VectorDriver, VectorStoreConfig, WebConfig,
};
pub use document::{ChunkMetadata, DocumentChunk, Language, SourceType, Topic};
pub use search::{Metadata, OutputFormat, RetrievedChunk};
