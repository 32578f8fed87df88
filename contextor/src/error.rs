//! Typed error for the contextor crate.

use ai_llm_service::{AiLlmError, FailureKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate (index, chunking, embedding).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Generation failed in the LLM layer.
    #[error("LLM error: {0}")]
    Llm(#[from] AiLlmError),

    /// Missing or invalid configuration (env values, prompt template).
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied question or text is unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ContextorError {
    /// Provider failure category, when this is a classified generation or
    /// embedding failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ContextorError::Llm(e) => e.failure_kind(),
            ContextorError::Rag(rag_store::RagError::Embedding(e)) => e.failure_kind(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ContextorError>;
