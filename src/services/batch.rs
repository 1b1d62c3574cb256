use crate::error::IngestError;
use crate::models::DocumentChunk;
use crate::services::{Embedder, VectorStore};

/// Embed the pending chunks and write them to the store, draining `chunks`.
///
/// Returns the number of records written.
pub async fn process_batch(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    chunks: &mut Vec<DocumentChunk>,
) -> Result<usize, IngestError> {
    if chunks.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_documents(texts).await?;

    if embeddings.len() != chunks.len() {
        return Err(IngestError::EmbeddingCountMismatch {
            chunks: chunks.len(),
            embeddings: embeddings.len(),
        });
    }

    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.dense_vector = embedding;
    }

    let batch = std::mem::take(chunks);
    let stored = batch.len();
    store.upsert_points(batch).await?;

    Ok(stored)
}
