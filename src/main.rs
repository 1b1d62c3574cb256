use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mlqa::cli::commands::{
    AskArgs, handle_ask, handle_config, handle_ingest, handle_serve, handle_status,
};
use mlqa::cli::{Cli, Commands};
use mlqa::models::{Config, OutputFormat};

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "mlqa=debug" } else { "mlqa=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let default_format = Config::load()
        .map(|c| c.output.default_format)
        .unwrap_or_default();
    let format = cli.format.unwrap_or(default_format);
    let verbose = cli.verbose;

    tokio::select! {
        result = run_command(cli.command, format, verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, exiting...");
        }
    }

    Ok(())
}

async fn run_command(command: Option<Commands>, format: OutputFormat, verbose: bool) -> Result<()> {
    match command {
        None => {
            let args = AskArgs {
                question: None,
                top_k: None,
            };
            handle_ask(args, format, verbose).await?;
        }
        Some(Commands::Ingest(args)) => {
            handle_ingest(args, format, verbose).await?;
        }
        Some(Commands::Ask(args)) => {
            handle_ask(args, format, verbose).await?;
        }
        Some(Commands::Serve(args)) => {
            handle_serve(args).await?;
        }
        Some(Commands::Status) => {
            handle_status(format, verbose).await?;
        }
        Some(Commands::Config(cmd)) => {
            handle_config(cmd, format, verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
