//! Knowledge-base diagnostics and lifecycle.

use std::sync::Arc;

use axum::{Json, extract::State, response::Response};
use tracing::{debug, info, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    error_handler::AppResult,
    routes::rag::rag_request::{
        ClearCollectionResponse, ReinitializeResponse, TestSearchRequest, TestSearchResponse,
    },
};

/// `GET /rag/status`
pub async fn rag_status_route(State(state): State<Arc<AppState>>) -> Response {
    ok(state.stack.orchestrator.status().await)
}

/// `POST /rag/test-search`: raw top-k hits with short previews.
pub async fn test_search_route(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TestSearchRequest>,
) -> AppResult<Response> {
    debug!(query = %req.query, "test_search_route: start");
    let results = state.stack.orchestrator.test_search(&req.query).await?;
    debug!(hits = results.len(), "test_search_route: done");
    Ok(ok(TestSearchResponse {
        query: req.query,
        results,
    }))
}

/// `POST /rag/reinitialize`: re-probes the collection.
pub async fn reinitialize_route(State(state): State<Arc<AppState>>) -> Response {
    let orchestrator = &state.stack.orchestrator;
    let initialized = orchestrator.reinitialize().await;
    if initialized {
        info!(collection = %orchestrator.collection(), "knowledge base reinitialized");
    } else {
        warn!(collection = %orchestrator.collection(), "knowledge base not loaded after reinitialize");
    }
    ok(ReinitializeResponse {
        collection: orchestrator.collection().to_string(),
        initialized,
    })
}

/// `DELETE /rag/collection`: removes every document, keeps the collection.
pub async fn clear_collection_route(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let orchestrator = &state.stack.orchestrator;
    let removed = orchestrator.clear_collection().await?;
    info!(collection = %orchestrator.collection(), removed, "collection cleared");
    Ok(ok(ClearCollectionResponse {
        collection: orchestrator.collection().to_string(),
        removed,
    }))
}
