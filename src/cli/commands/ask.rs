use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{
    ChatClient, EmbeddingClient, QaPipeline, VectorRetriever, create_backend_with_embedding_config,
};

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Question to answer; omit to start the interactive loop
    pub question: Option<String>,

    /// Number of chunks to retrieve
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,
}

/// Whether a loop input ends the session.
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Build the retrieval and generation pipeline from configuration.
pub async fn build_pipeline(config: &Config, top_k: Option<usize>) -> Result<QaPipeline> {
    let api_key = Config::api_key()?;
    let embedder = EmbeddingClient::new(&config.embedding, &api_key)?;
    let generator = ChatClient::new(&config.generation, &api_key)?;
    let store = create_backend_with_embedding_config(&config.vector_store, &config.embedding)
        .await
        .context("failed to open vector store")?;

    let retriever = VectorRetriever::new(Arc::new(embedder), Arc::from(store));
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    if top_k == 0 {
        anyhow::bail!("top_k must be at least 1");
    }

    Ok(QaPipeline::new(
        Arc::new(retriever),
        Arc::new(generator),
        top_k,
    ))
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let pipeline = build_pipeline(&config, args.top_k).await?;

    match args.question {
        Some(question) => {
            if question.trim().is_empty() {
                anyhow::bail!("question cannot be empty");
            }
            let answer = pipeline
                .ask(&question)
                .await
                .context("failed to answer question")?;
            print!("{}", formatter.format_answer(&answer));
            Ok(())
        }
        None => run_loop(&pipeline, formatter.as_ref(), verbose).await,
    }
}

async fn run_loop(pipeline: &QaPipeline, formatter: &dyn Formatter, verbose: bool) -> Result<()> {
    println!(
        "{}",
        style("Ask a question about the documents (type 'exit' to quit).").bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{} ", style("Question:").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        if is_exit_command(&line) {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        if verbose {
            eprintln!("Retrieving top {} chunks...", pipeline.top_k());
        }

        match pipeline.ask(question).await {
            Ok(answer) => print!("{}", formatter.format_answer(&answer)),
            Err(e) => eprint!("{}", formatter.format_error(&e.to_string())),
        }
    }

    Ok(())
}
