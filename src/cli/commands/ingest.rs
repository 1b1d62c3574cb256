//! Ingest command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{
    EmbeddingClient, FileExtractor, Ingestor, WordChunker, create_backend_with_embedding_config,
    discover_files,
};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Remove every stored chunk before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Show which files would be ingested without extracting or embedding
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let files = discover_files(&config.ingest).context("failed to list dataset files")?;

    if files.is_empty() {
        print!("{}", formatter.format_message("No files found to ingest."));
        return Ok(());
    }

    if verbose {
        eprintln!("Found {} files to process", files.len());
    }

    if args.dry_run {
        print!("{}", formatter.format_files(&files));
        return Ok(());
    }

    let api_key = Config::api_key()?;
    let embedder = EmbeddingClient::new(&config.embedding, &api_key)?;
    let store = create_backend_with_embedding_config(&config.vector_store, &config.embedding)
        .await
        .context("failed to open vector store")?;

    if args.reset {
        store
            .clear_collection()
            .await
            .context("failed to clear collection")?;
        if verbose {
            eprintln!("Cleared collection {}", store.collection());
        }
    }

    let ingestor = Ingestor::new(
        Arc::new(FileExtractor::new(&config.ingest)),
        &embedder,
        store.as_ref(),
        WordChunker::new(&config.ingest),
        config.embedding.batch_size as usize,
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let stats = ingestor
        .run(&files, |file, chunks| {
            pb.inc(1);
            pb.set_message(file.filename());
            if verbose {
                pb.println(format!("{} -> {} chunks", file.path.display(), chunks));
            }
        })
        .await;
    pb.finish_and_clear();

    let stats = stats.context("ingestion failed")?;
    print!("{}", formatter.format_ingest_stats(&stats));

    Ok(())
}
