use anyhow::Result;
use clap::Args;

use super::build_pipeline;
use crate::models::Config;
use crate::server::{AppState, WebServer};
use crate::services::FeedbackLog;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind (overrides web.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides web.port)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,
}

pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }

    let pipeline = build_pipeline(&config, None).await?;
    let feedback = FeedbackLog::new(&config.web.feedback_log);
    let server = WebServer::new(&config.web, AppState::new(pipeline, feedback));

    eprintln!("Serving on http://{}", server.address());
    eprintln!("Feedback log: {}", config.web.feedback_log.display());

    server.start().await?;
    Ok(())
}
