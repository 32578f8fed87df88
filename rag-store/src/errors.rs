//! Unified error types for the crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Caller-supplied text is empty or otherwise unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Similarity query is malformed (blank text, `k == 0`).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The vector index could not be reached (connect/timeout/gateway errors).
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// The named collection does not exist in the index.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// The index answered with an unexpected status.
    #[error("index error: HTTP {status} at {url}: {snippet}")]
    IndexProtocol {
        status: u16,
        url: String,
        snippet: String,
    },

    /// Embedding generation failed in the LLM layer.
    #[error("embedding error: {0}")]
    Embedding(#[from] AiLlmError),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality across records.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },
}

impl RagError {
    /// `true` when the failure means "the index is down", not "the request was wrong".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, RagError::IndexUnavailable(_))
    }
}
