//! Web interface: question form, answers with sources, and a feedback log.

mod pages;
mod routes;
mod state;

pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::WebConfig;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/feedback", post(routes::feedback))
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub struct WebServer {
    addr: String,
    state: AppState,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Self {
        Self {
            addr: format!("{}:{}", config.host, config.port),
            state,
        }
    }

    pub fn address(&self) -> &str {
        &self.addr
    }

    /// Serve until the process is stopped.
    pub async fn start(self) -> Result<(), AppError> {
        let addr: SocketAddr = self
            .addr
            .parse()
            .map_err(|e| AppError::Server(format!("invalid address {}: {}", self.addr, e)))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Server(format!("failed to bind {}: {}", addr, e)))?;

        tracing::info!("Web interface listening on http://{}", addr);

        axum::serve(listener, build_router(self.state))
            .await
            .map_err(|e| AppError::Server(e.to_string()))
    }
}
