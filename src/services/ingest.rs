//! Ingestion of the bilingual dataset into the vector store.
//!
//! Each language partition has a `pdf` and a `txt` folder. Files are read in
//! file-name order, chunked, tagged and aggregated before being embedded in
//! batches and written to the store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use walkdir::WalkDir;

use super::batch::process_batch;
use super::chunker::WordChunker;
use super::embedding::Embedder;
use super::extract::TextExtractor;
use super::normalize::prepare_text;
use super::topic::infer_topic;
use super::vector_store::VectorStore;
use crate::error::IngestError;
use crate::models::{ChunkMetadata, DocumentChunk, IngestConfig, Language, SourceType};

/// A discovered input file and the partition it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub lang: Language,
    pub source_type: SourceType,
}

impl SourceFile {
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub files_scanned: u64,
    pub files_indexed: u64,
    pub chunks_created: u64,
    pub chunks_stored: u64,
    pub duration_ms: u64,
}

/// Folders to scan, Arabic partition first.
fn partition_folders(config: &IngestConfig) -> Vec<(Language, &Path)> {
    vec![
        (Language::Ar, config.arabic.pdf.as_path()),
        (Language::Ar, config.arabic.txt.as_path()),
        (Language::En, config.english.pdf.as_path()),
        (Language::En, config.english.txt.as_path()),
    ]
}

/// List the `.pdf`/`.txt` files of every partition folder.
///
/// Folders are not descended into. A missing folder is skipped with a warning.
pub fn discover_files(config: &IngestConfig) -> Result<Vec<SourceFile>, IngestError> {
    let mut files = Vec::new();

    for (lang, dir) in partition_folders(config) {
        if !dir.is_dir() {
            tracing::warn!("Dataset folder not found, skipping: {}", dir.display());
            continue;
        }

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IngestError::WalkError(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if let Some(source_type) = SourceType::from_path(&path) {
                files.push(SourceFile {
                    path,
                    lang,
                    source_type,
                });
            }
        }
    }

    Ok(files)
}

pub struct Ingestor<'a> {
    extractor: Arc<dyn TextExtractor>,
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStore,
    chunker: WordChunker,
    batch_size: usize,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: &'a dyn Embedder,
        store: &'a dyn VectorStore,
        chunker: WordChunker,
        batch_size: usize,
    ) -> Self {
        Self {
            extractor,
            embedder,
            store,
            chunker,
            batch_size: batch_size.max(1),
        }
    }

    /// Run the extractor on the blocking pool; PDF parsing and OCR block.
    async fn extract(&self, file: &SourceFile) -> Result<String, IngestError> {
        let extractor = self.extractor.clone();
        let path = file.path.clone();
        let raw = tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;
        Ok(raw)
    }

    /// Extract, clean, chunk and tag a single file.
    pub async fn build_chunks(&self, file: &SourceFile) -> Result<Vec<DocumentChunk>, IngestError> {
        let raw = self.extract(file).await?;
        let text = prepare_text(&raw, file.lang.needs_normalization());

        let filename = file.filename();
        let topic = infer_topic(&filename);
        let ingested_at = chrono::Utc::now().to_rfc3339();

        let chunks = self
            .chunker
            .chunk(&text)
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                DocumentChunk::new(
                    content,
                    ChunkMetadata {
                        filename: filename.clone(),
                        lang: file.lang,
                        chunk_id: index as u32,
                        source_type: file.source_type,
                        topic,
                        source: filename.clone(),
                        ingested_at: ingested_at.clone(),
                    },
                )
            })
            .collect();

        Ok(chunks)
    }

    /// Ingest `files`, calling `on_file` after each one has been chunked.
    ///
    /// Any extraction or storage failure aborts the run.
    pub async fn run<F>(&self, files: &[SourceFile], mut on_file: F) -> Result<IngestStats, IngestError>
    where
        F: FnMut(&SourceFile, usize),
    {
        let start = Instant::now();
        let mut stats = IngestStats {
            files_scanned: files.len() as u64,
            ..Default::default()
        };

        let mut all_chunks = Vec::new();
        for file in files {
            let chunks = self.build_chunks(file).await?;
            tracing::debug!("{}: {} chunks", file.path.display(), chunks.len());
            on_file(file, chunks.len());

            if !chunks.is_empty() {
                stats.files_indexed += 1;
            }
            stats.chunks_created += chunks.len() as u64;
            all_chunks.extend(chunks);
        }

        if !all_chunks.is_empty() {
            self.store.create_collection().await?;
        }

        let mut pending = Vec::with_capacity(self.batch_size);
        for chunk in all_chunks {
            pending.push(chunk);
            if pending.len() >= self.batch_size {
                stats.chunks_stored +=
                    process_batch(self.embedder, self.store, &mut pending).await? as u64;
            }
        }
        stats.chunks_stored += process_batch(self.embedder, self.store, &mut pending).await? as u64;

        stats.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Stored {} chunks from {} files in {}ms",
            stats.chunks_stored,
            stats.files_indexed,
            stats.duration_ms
        );
        Ok(stats)
    }
}
