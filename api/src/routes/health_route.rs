use std::sync::Arc;

use ai_llm_service::health_service::HealthStatus;
use axum::{extract::State, http::StatusCode, response::Response};
use contextor::RagStatus;
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `true` when the index is reachable and every model probe passed.
    pub ok: bool,
    pub rag: RagStatus,
    pub llm: Vec<HealthStatus>,
}

/// `GET /health`: always 200; `ok` tells whether dependencies are healthy.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let (rag, llm) = tokio::join!(state.stack.orchestrator.status(), state.llm.health_all());
    let ok = rag.index_reachable && llm.iter().all(|h| h.ok);
    ApiResponse::success(HealthResponse { ok, rag, llm }).into_response_with_status(StatusCode::OK)
}
