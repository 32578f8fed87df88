//! Chat arbitration: knowledge base first, general model as fallback.
//!
//! `AttemptingRag → EvaluatingConfidence → AcceptRag | FallbackGeneral`.
//! Any error on the RAG path falls back; only a general-answer failure
//! reaches the caller.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::api_types::{ChatAnswer, FallbackReason};
use crate::error::Result;
use crate::general::GeneralAnswerer;
use crate::orchestrator::{
    NO_INFORMATION_REPLY, NOT_LOADED_REPLY, PROVIDER_FAILURE_REPLY, RagOrchestrator, RagReply,
};

/// Grounded answers shorter than this (in chars) are treated as low confidence.
pub const DEFAULT_LOW_CONFIDENCE_MIN_CHARS: usize = 20;

/// Refusal phrasings a grounded model uses when the context lacks the answer.
const REFUSAL_PHRASES: &[&str] = &[
    "I don't have that information",
    "I do not have that information",
    "I don't have information",
    "I do not have information",
    "I don't have enough information",
    "not in the knowledge base",
    "not mentioned in the context",
    "the context does not contain",
    "I couldn't find",
    "I could not find",
    "no information available",
];

/// Default phrase list: the orchestrator's fixed replies plus [`REFUSAL_PHRASES`].
pub fn default_no_info_phrases() -> Vec<String> {
    [NOT_LOADED_REPLY, NO_INFORMATION_REPLY, PROVIDER_FAILURE_REPLY]
        .iter()
        .chain(REFUSAL_PHRASES)
        .map(|p| p.to_string())
        .collect()
}

/// Lexical check over a grounded answer. Two independent checks: a
/// case-insensitive phrase match and a minimum length.
#[derive(Clone, Debug)]
pub struct LowConfidenceDetector {
    phrases: Vec<String>,
    min_chars: usize,
}

impl Default for LowConfidenceDetector {
    fn default() -> Self {
        Self::new(&default_no_info_phrases(), DEFAULT_LOW_CONFIDENCE_MIN_CHARS)
    }
}

impl LowConfidenceDetector {
    pub fn new(phrases: &[String], min_chars: usize) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| fold(p.trim()))
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases, min_chars }
    }

    /// `true` when `text` contains any configured phrase (case-insensitive).
    pub fn matches_no_info_phrase(&self, text: &str) -> bool {
        let text = fold(text);
        self.phrases.iter().any(|p| text.contains(p.as_str()))
    }

    /// `true` when the trimmed `text` is shorter than the minimum.
    pub fn below_length_floor(&self, text: &str) -> bool {
        text.trim().chars().count() < self.min_chars
    }

    /// The first check that fires, if any.
    pub fn evaluate(&self, text: &str) -> Option<FallbackReason> {
        if self.matches_no_info_phrase(text) {
            Some(FallbackReason::NoInfoPhrase)
        } else if self.below_length_floor(text) {
            Some(FallbackReason::TooShort)
        } else {
            None
        }
    }
}

/// Lowercases and folds typographic apostrophes so "don’t" matches "don't".
fn fold(s: &str) -> String {
    s.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Top-level chat policy.
pub struct ChatArbiter {
    rag: Arc<RagOrchestrator>,
    general: Arc<GeneralAnswerer>,
    detector: LowConfidenceDetector,
}

impl ChatArbiter {
    pub fn new(
        rag: Arc<RagOrchestrator>,
        general: Arc<GeneralAnswerer>,
        detector: LowConfidenceDetector,
    ) -> Self {
        Self {
            rag,
            general,
            detector,
        }
    }

    /// Answers `question`, preferring a confident knowledge-base answer.
    ///
    /// # Errors
    /// Only when the general answerer fails.
    #[instrument(skip_all)]
    pub async fn chat(&self, question: &str) -> Result<ChatAnswer> {
        debug!(state = "attempting_rag");
        let reason = match self.rag.ask_reply(question).await {
            Ok(RagReply::Answer(text)) => {
                debug!(state = "evaluating_confidence", answer_len = text.len());
                match self.detector.evaluate(&text) {
                    None => {
                        info!(state = "accept_rag", "answered from knowledge base");
                        return Ok(ChatAnswer::knowledge_base(text));
                    }
                    Some(reason) => reason,
                }
            }
            Ok(RagReply::NotLoaded) => FallbackReason::NotLoaded,
            Ok(RagReply::NoInformation) => FallbackReason::NoInformation,
            Ok(RagReply::ProviderFailure(kind)) => {
                warn!(?kind, "grounded provider failure");
                FallbackReason::ProviderFailure
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.failure_kind(), "RAG path failed");
                e.failure_kind()
                    .map_or(FallbackReason::RagError, |_| FallbackReason::ProviderFailure)
            }
        };

        info!(state = "fallback_general", ?reason, "falling back to general answer");
        let answer = self.general.answer(question).await?;
        Ok(ChatAnswer::general(answer, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_check_is_case_insensitive_and_folds_apostrophes() {
        let d = LowConfidenceDetector::default();
        assert!(d.matches_no_info_phrase("Sorry, I DON’T HAVE THAT INFORMATION in my notes."));
        assert!(d.matches_no_info_phrase(NO_INFORMATION_REPLY));
        assert!(!d.matches_no_info_phrase("A standard cleaning costs $80 and takes 45 minutes."));
    }

    #[test]
    fn length_floor_counts_trimmed_chars() {
        let d = LowConfidenceDetector::new(&["nope".to_string()], 20);
        assert!(d.below_length_floor("   Yes, we do.   "));
        assert!(!d.below_length_floor("Yes, we accept most insurance plans."));
        assert_eq!(d.evaluate("Yes."), Some(FallbackReason::TooShort));
        assert_eq!(d.evaluate("Nope, that is not something we offer."), Some(FallbackReason::NoInfoPhrase));
        assert_eq!(d.evaluate("Yes, we accept most insurance plans."), None);
    }

    #[test]
    fn defaults_include_fixed_replies() {
        let phrases = default_no_info_phrases();
        assert!(phrases.iter().any(|p| p == NOT_LOADED_REPLY));
        assert!(phrases.iter().any(|p| p == PROVIDER_FAILURE_REPLY));
    }
}
