use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use rag_store::RagError;
use thiserror::Error;
use tracing::{error, warn};

use crate::core::{
    app_state::ConfigError,
    http::response_envelope::{ApiErrorDetail, ApiResponse},
};

/// Shown for a failed chat instead of the provider's error text.
pub const ANSWER_FAILED_MESSAGE: &str =
    "The assistant could not produce an answer right now. Please try again later.";

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Http { status, .. } => *status,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            AppError::Http { code, .. } => code,
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        match self {
            AppError::UnsupportedMediaType(_) => vec![ApiErrorDetail::hint(
                "Upload a PDF (application/pdf) or a text file (text/*, application/json).",
            )],
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        } else {
            warn!(code = self.error_code(), error = %self, "request rejected");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), self.details())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Http {
                status,
                code: "PAYLOAD_TOO_LARGE",
                message: "Uploaded file exceeds the configured size limit.".into(),
            }
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

/// Maps core errors to HTTP statuses. Provider details never reach the client.
impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        match err {
            ContextorError::InvalidInput(msg) => AppError::BadRequest(msg),
            ContextorError::Config(msg) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "CONFIG_ERROR",
                message: format!("Service is misconfigured: {msg}"),
            },
            ContextorError::Llm(e) => {
                error!(error = %e, kind = ?e.failure_kind(), "answer generation failed");
                AppError::Http {
                    status: StatusCode::BAD_GATEWAY,
                    code: "ANSWER_FAILED",
                    message: ANSWER_FAILED_MESSAGE.into(),
                }
            }
            ContextorError::Rag(e) => e.into(),
        }
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::InvalidInput(msg) | RagError::InvalidQuery(msg) => {
                AppError::BadRequest(msg)
            }
            RagError::IndexUnavailable(msg) => AppError::Http {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "INDEX_UNAVAILABLE",
                message: format!("The knowledge base index is unavailable: {msg}"),
            },
            RagError::CollectionNotFound(name) => AppError::Http {
                status: StatusCode::NOT_FOUND,
                code: "COLLECTION_NOT_FOUND",
                message: format!("Collection `{name}` does not exist."),
            },
            RagError::Embedding(e) => {
                error!(error = %e, "embedding failed");
                AppError::Http {
                    status: StatusCode::BAD_GATEWAY,
                    code: "EMBEDDING_FAILED",
                    message: "Could not compute embeddings for the request.".into(),
                }
            }
            other => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INDEX_ERROR",
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ai_llm_service::AiLlmError;

    use super::*;

    #[test]
    fn provider_failure_is_a_generic_bad_gateway() {
        let err: AppError = ContextorError::Llm(AiLlmError::Timeout(Duration::from_secs(30))).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "ANSWER_FAILED");
        assert_eq!(err.to_string(), ANSWER_FAILED_MESSAGE);
    }

    #[test]
    fn index_errors_keep_their_meaning() {
        let down: AppError = ContextorError::Rag(RagError::IndexUnavailable("refused".into())).into();
        assert_eq!(down.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(down.error_code(), "INDEX_UNAVAILABLE");

        let missing: AppError = RagError::CollectionNotFound("faq".into()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let bad: AppError = RagError::InvalidQuery("k must be > 0".into()).into();
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let proto: AppError = RagError::IndexProtocol {
            status: 500,
            url: "http://chroma/api/v2".into(),
            snippet: "boom".into(),
        }
        .into();
        assert_eq!(proto.error_code(), "INDEX_ERROR");
    }

    #[test]
    fn invalid_input_is_bad_request() {
        let err: AppError = ContextorError::InvalidInput("question is empty".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "BAD_REQUEST");
    }
}
