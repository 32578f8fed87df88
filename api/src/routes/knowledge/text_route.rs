use std::sync::Arc;

use axum::{Json, extract::State, response::Response};
use tracing::info;

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    error_handler::{AppError, AppResult},
    routes::knowledge::knowledge_request::{IngestResponse, IngestTextRequest},
};

const INLINE_SOURCE: &str = "inline";

/// `POST /knowledge/text`.
pub async fn ingest_text_route(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestTextRequest>,
) -> AppResult<Response> {
    let orchestrator = &state.stack.orchestrator;
    let source = req
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(INLINE_SOURCE)
        .to_string();

    let (source, stored) = match (req.text, req.texts) {
        (Some(text), None) => {
            let stored = orchestrator.ingest_text(&source, &text).await?;
            (source, stored)
        }
        // Raw texts are stored one document each under the inline label.
        (None, Some(texts)) => (
            INLINE_SOURCE.to_string(),
            orchestrator.add_documents(&texts).await?,
        ),
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "send either `text` or `texts`, not both".into(),
            ));
        }
        (None, None) => {
            return Err(AppError::BadRequest("one of `text` or `texts` is required".into()));
        }
    };

    info!(collection = %orchestrator.collection(), %source, stored, "text ingested");
    Ok(ok(IngestResponse {
        collection: orchestrator.collection().to_string(),
        source,
        stored,
    }))
}
