use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use tracing::{debug, info};

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    error_handler::AppResult,
    routes::chat::chat_request::{ChatRequest, DirectChatResponse},
};

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}

/// `POST /chat`: knowledge base first, general model as fallback.
pub async fn chat_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    debug!(%request_id, question_len = req.question.len(), "chat_route: start");

    let answer = state.stack.arbiter.chat(&req.question).await?;

    info!(
        %request_id,
        source = ?answer.source,
        fallback = ?answer.fallback_reason,
        "chat_route: answered"
    );
    Ok(ok(answer))
}

/// `POST /chat/direct`: general model only, no retrieval.
pub async fn direct_chat_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    debug!(%request_id, "direct_chat_route: start");

    let answer = state.stack.general.answer(&req.question).await?;
    Ok(ok(DirectChatResponse { answer }))
}
