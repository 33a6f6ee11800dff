use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use datahub_store::StoreManager;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};

use crate::config::ServiceConfig;

pub mod api;
mod health;

const DATASETS_PREFIX: &str = "/datasets";
const STATUS_PREFIX: &str = "/_status";

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<StoreManager>,
}

impl AppState {
    pub fn new(store: StoreManager) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &Arc<StoreManager> {
        &self.store
    }
}

/// All routes, without the tracing layer.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .nest(STATUS_PREFIX, health::router())
        .nest(DATASETS_PREFIX, api::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn run(config: ServiceConfig, store: StoreManager) -> Result<(), HttpServerError> {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(config.log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(AppState::new(store), config.max_upload_bytes).layer(trace_layer);

    tracing::info!(addr = ?config.listen_addr, "datahub listening");
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl+c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
