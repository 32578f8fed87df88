//! Public API types re-used by external crates (e.g., the HTTP API layer).

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which path produced a chat answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    KnowledgeBase,
    General,
}

/// Why the knowledge-base answer was not used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The collection is not initialized.
    NotLoaded,
    /// Retrieval found nothing relevant.
    NoInformation,
    /// The grounded model call failed in a classified way.
    ProviderFailure,
    /// The RAG path raised an error (index down, bad query, ...).
    RagError,
    /// The grounded answer contains a "no information" phrase.
    NoInfoPhrase,
    /// The grounded answer is shorter than the confidence floor.
    TooShort,
}

/// Final chat answer with its provenance.
///
/// # Example
/// ```
/// use contextor::{AnswerSource, ChatAnswer};
/// let a = ChatAnswer::knowledge_base("A cleaning costs $80.");
/// assert_eq!(a.source, AnswerSource::KnowledgeBase);
/// assert!(a.fallback_reason.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub source: AnswerSource,
    pub fallback_reason: Option<FallbackReason>,
}

impl ChatAnswer {
    pub fn knowledge_base(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            source: AnswerSource::KnowledgeBase,
            fallback_reason: None,
        }
    }

    pub fn general(answer: impl Into<String>, reason: FallbackReason) -> Self {
        Self {
            answer: answer.into(),
            source: AnswerSource::General,
            fallback_reason: Some(reason),
        }
    }
}

/// Diagnostics snapshot of the knowledge base.
#[derive(Clone, Debug, Serialize)]
pub struct RagStatus {
    pub collection: String,
    pub initialized: bool,
    pub index_reachable: bool,
    /// `None` when the count could not be read.
    pub document_count: Option<usize>,
    pub index_version: Option<String>,
    pub last_probe_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// One hit of a diagnostic search.
#[derive(Clone, Debug, Serialize)]
pub struct SearchPreview {
    pub score: f32,
    pub source: Option<String>,
    pub chunk_index: Option<i64>,
    pub preview: String,
}
