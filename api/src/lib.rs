//! HTTP surface of the knowledge-base chat backend.

use std::{error::Error, sync::Arc};

pub mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use ai_llm_service::{LlmServiceProfiles, config::default_config::profiles_from_env};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};
use contextor::{ChatStack, ContextorConfig};
use tokio::signal;
use tracing::{error, info};

pub use crate::core::app_state::{ApiConfig, AppState};
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        chat::chat_route::{chat_route, direct_chat_route},
        health_route::health_route,
        knowledge::{text_route::ingest_text_route, upload_route::upload_route},
        rag::rag_route::{
            clear_collection_route, rag_status_route, reinitialize_route, test_search_route,
        },
    },
};

/// Timeout for LLM health probes, seconds.
const HEALTH_TIMEOUT_SECS: u64 = 10;

/// Builds the router over prepared state.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.upload_limit_bytes;
    Router::new()
        .route("/chat", post(chat_route))
        .route("/chat/direct", post(direct_chat_route))
        .route("/knowledge/upload", post(upload_route))
        .route("/knowledge/text", post(ingest_text_route))
        .route("/rag/status", get(rag_status_route))
        .route("/rag/test-search", post(test_search_route))
        .route("/rag/reinitialize", post(reinitialize_route))
        .route("/rag/collection", delete(clear_collection_route))
        .route("/health", get(health_route))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Reads configuration, wires the chat stack and serves until Ctrl+C.
pub async fn start() -> Result<(), Box<dyn Error>> {
    let api_cfg = ApiConfig::from_env()?;
    let svc = Arc::new(LlmServiceProfiles::from_configs(
        profiles_from_env()?,
        Some(HEALTH_TIMEOUT_SECS),
    )?);
    let ctx_cfg = ContextorConfig::from_env()?;
    let stack = ChatStack::build(&ctx_cfg, svc.clone()).await?;

    let state = Arc::new(AppState::new(stack, svc, api_cfg.upload_limit_bytes));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&api_cfg.address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %api_cfg.address, "API listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("API stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed. If the handler cannot be installed the
/// server keeps running.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
