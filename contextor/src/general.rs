//! General answers without retrieval: the fallback and direct-chat path.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument};

use crate::error::{ContextorError, Result};
use crate::llm::ChatModel;
use crate::prompt::GENERAL_SYSTEM;

/// Calls the open-ended model profile with a persona system message.
#[derive(Clone)]
pub struct GeneralAnswerer {
    chat: Arc<dyn ChatModel>,
    system: String,
}

impl GeneralAnswerer {
    /// Uses the built-in persona.
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self::with_system(chat, GENERAL_SYSTEM)
    }

    pub fn with_system(chat: Arc<dyn ChatModel>, system: impl Into<String>) -> Self {
        Self {
            chat,
            system: system.into(),
        }
    }

    /// Answers `question` from the model's general knowledge.
    ///
    /// # Errors
    /// `InvalidInput` for a blank question; `Llm` for any provider failure
    /// (see [`ContextorError::failure_kind`]).
    #[instrument(skip_all)]
    pub async fn answer(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ContextorError::InvalidInput("question is empty".into()));
        }

        let started = Instant::now();
        let text = self
            .chat
            .complete(question, Some(&self.system))
            .await
            .map_err(|e| {
                error!(kind = ?e.failure_kind(), error = %e, "general answer failed");
                ContextorError::Llm(e)
            })?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            answer_len = text.len(),
            "general answer generated"
        );
        Ok(text.trim().to_string())
    }
}
