//! CLI module for the bilingual document Q&A tool.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Ask questions about a bilingual (Arabic/English) document collection.
#[derive(Debug, Parser)]
#[command(name = "mlqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Without a subcommand, starts the interactive question loop.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract, chunk and embed the dataset into the vector store
    Ingest(commands::IngestArgs),

    /// Ask a question, or start the interactive loop when none is given
    Ask(commands::AskArgs),

    /// Run the web interface
    Serve(commands::ServeArgs),

    /// Check API credentials, vector store and dataset
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["mlqa"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_ask_one_shot() {
        let cli = Cli::try_parse_from(["mlqa", "ask", "ما هي سياسة الجودة؟", "-f", "json"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Some(Commands::Ask(args)) => {
                assert_eq!(args.question.as_deref(), Some("ما هي سياسة الجودة؟"))
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ingest_flags() {
        let cli = Cli::try_parse_from(["mlqa", "ingest", "--reset", "--dry-run"]).unwrap();
        match cli.command {
            Some(Commands::Ingest(args)) => {
                assert!(args.reset);
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::try_parse_from(["mlqa", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => assert_eq!(args.port, Some(9000)),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
