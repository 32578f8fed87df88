use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::Response,
};
use tracing::{debug, info};

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    error_handler::{AppError, AppResult},
    routes::knowledge::{
        extract::{classify, extract_text},
        knowledge_request::IngestResponse,
    },
};

const FILE_FIELD: &str = "file";
const SOURCE_FIELD: &str = "source";

struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// `POST /knowledge/upload`: multipart form with a `file` part and an
/// optional `source` part overriding the stored source label.
pub async fn upload_route(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut upload: Option<Upload> = None;
    let mut source_override: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                upload = Some(Upload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            SOURCE_FIELD => source_override = Some(field.text().await?),
            other => debug!(field = %other, "ignoring multipart field"),
        }
    }

    let upload = upload
        .ok_or_else(|| AppError::BadRequest(format!("multipart field `{FILE_FIELD}` is required")))?;
    let kind = classify(upload.content_type.as_deref(), upload.file_name.as_deref())?;
    let source = source_override
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| upload.file_name.clone())
        .unwrap_or_else(|| "upload".to_string());

    debug!(%source, ?kind, size = upload.bytes.len(), "upload received");
    let text = extract_text(kind, upload.bytes).await?;

    let orchestrator = &state.stack.orchestrator;
    let stored = orchestrator.ingest_text(&source, &text).await?;

    info!(collection = %orchestrator.collection(), %source, stored, "document uploaded");
    Ok(ok(IngestResponse {
        collection: orchestrator.collection().to_string(),
        source,
        stored,
    }))
}
