mod batch;
mod chunker;
mod embedding;
mod extract;
mod feedback;
mod generation;
mod ingest;
mod normalize;
mod prompt;
mod qa;
mod retrieval;
mod topic;
mod vector_store;

pub use batch::process_batch;
pub use chunker::{WordChunker, chunk_text};
pub use embedding::{Embedder, EmbeddingClient, InputType};
pub use extract::{FileExtractor, TextExtractor};
pub use feedback::FeedbackLog;
pub use generation::{ChatClient, Generator};
pub use ingest::{IngestStats, Ingestor, SourceFile, discover_files};
pub use normalize::{clean_text, normalize_arabic, prepare_text};
pub use prompt::{build_prompt, parse_answer};
pub use qa::QaPipeline;
pub use retrieval::{Retriever, UNKNOWN_SOURCE, VectorRetriever, backfill_source, retrieve_cited};
pub use topic::infer_topic;
pub use vector_store::{
    CollectionInfo, LocalBackend, QdrantBackend, VectorStore, create_backend,
    create_backend_with_embedding_config,
};
