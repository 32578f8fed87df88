//! Grounded answer synthesis over retrieved context.

use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::FailureKind;
use rag_store::ScoredDocument;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{ContextorError, Result};
use crate::llm::ChatModel;
use crate::prompt::{PromptTemplate, build_context};

/// Result of one synthesis attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// Answer generated from the retrieved context.
    Grounded(String),
    /// Nothing relevant was retrieved; the provider was not called.
    NoInformation,
    /// The provider failed in a recoverable, classified way.
    ProviderError(FailureKind),
}

/// Builds the grounded prompt and calls the low-temperature model once.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    chat: Arc<dyn ChatModel>,
    template: PromptTemplate,
}

impl AnswerSynthesizer {
    /// `chat` should be configured near-deterministic (temperature 0–0.1).
    pub fn new(chat: Arc<dyn ChatModel>, template: PromptTemplate) -> Self {
        Self { chat, template }
    }

    /// Answers `question` from `hits`.
    ///
    /// # Errors
    /// Provider failures without a [`FailureKind`] (bad credentials, invalid
    /// configuration) are returned as `ContextorError::Llm`.
    #[instrument(skip_all, fields(hits = hits.len()))]
    pub async fn synthesize(&self, question: &str, hits: &[ScoredDocument]) -> Result<AnswerOutcome> {
        if hits.is_empty() {
            debug!("empty retrieval; skipping provider call");
            return Ok(AnswerOutcome::NoInformation);
        }

        let context = build_context(hits);
        let prompt = self.template.render(&context, question.trim());
        let started = Instant::now();

        match self.chat.complete(&prompt, None).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("grounded completion was empty");
                Ok(AnswerOutcome::ProviderError(FailureKind::Malformed))
            }
            Ok(text) => {
                info!(
                    latency_ms = started.elapsed().as_millis(),
                    context_len = context.len(),
                    answer_len = text.len(),
                    "grounded answer generated"
                );
                Ok(AnswerOutcome::Grounded(text.trim().to_string()))
            }
            Err(e) => match e.failure_kind() {
                Some(kind) => {
                    warn!(?kind, error = %e, "grounded generation failed");
                    Ok(AnswerOutcome::ProviderError(kind))
                }
                None => Err(ContextorError::Llm(e)),
            },
        }
    }
}
