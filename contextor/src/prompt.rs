//! Prompt template for grounded answers and the context block builder.

use std::path::Path;

use rag_store::ScoredDocument;
use tracing::info;

use crate::error::{ContextorError, Result};

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// System instructions for answers given without retrieved context.
pub const GENERAL_SYSTEM: &str = "You are a friendly assistant for a dental clinic. \
Answer patient questions clearly and briefly. Give general guidance only, never a diagnosis, \
and suggest booking a visit when a question needs a professional opinion. \
Quote prices and measurements with their units and currency.";

/// Instruction template with `{context}` and `{question}` slots.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Parses a template, requiring both slots.
    ///
    /// # Errors
    /// `ContextorError::Config` if `{context}` or `{question}` is missing.
    pub fn parse(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for slot in [CONTEXT_SLOT, QUESTION_SLOT] {
            if !template.contains(slot) {
                return Err(ContextorError::Config(format!(
                    "prompt template has no {slot} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// Loads and parses a template file.
    ///
    /// # Errors
    /// `ContextorError::Config` if the file cannot be read or lacks a slot.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ContextorError::Config(format!("cannot read prompt template {}: {e}", path.display()))
        })?;
        let tpl = Self::parse(raw)?;
        info!(path = %path.display(), len = tpl.template.len(), "prompt template loaded");
        Ok(tpl)
    }

    /// Fills both slots. The context is inserted first so a literal
    /// `{question}` inside retrieved text is not substituted.
    pub fn render(&self, context: &str, question: &str) -> String {
        match self.template.split_once(CONTEXT_SLOT) {
            Some((before, after)) => {
                let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
                out.push_str(&before.replace(QUESTION_SLOT, question));
                out.push_str(context);
                out.push_str(&after.replace(QUESTION_SLOT, question));
                out
            }
            None => self.template.replace(QUESTION_SLOT, question),
        }
    }
}

/// Joins document contents in ranked order, separated by a blank line.
pub fn build_context(hits: &[ScoredDocument]) -> String {
    hits.iter()
        .map(|h| h.document.content().trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rag_store::Document;
    use std::io::Write;

    #[test]
    fn renders_both_slots() {
        let tpl = PromptTemplate::parse("Context:\n{context}\n\nQ: {question}\nA:").unwrap();
        assert_eq!(
            tpl.render("Cleaning costs $80.", "How much is a cleaning?"),
            "Context:\nCleaning costs $80.\n\nQ: How much is a cleaning?\nA:"
        );
    }

    #[test]
    fn context_text_is_not_reinterpreted() {
        let tpl = PromptTemplate::parse("{context} | {question}").unwrap();
        assert_eq!(tpl.render("literal {question}", "q"), "literal {question} | q");
    }

    #[test]
    fn missing_slot_is_a_config_error() {
        assert!(matches!(
            PromptTemplate::parse("Answer: {question}"),
            Err(ContextorError::Config(_))
        ));
        assert!(matches!(
            PromptTemplate::parse("Just answer."),
            Err(ContextorError::Config(_))
        ));
    }

    #[test]
    fn loads_from_file_and_reports_missing_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "Use only:\n{{context}}\nQuestion: {{question}}").unwrap();
        let tpl = PromptTemplate::load(f.path()).unwrap();
        assert!(tpl.render("c", "q").ends_with("Question: q"));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PromptTemplate::load(dir.path().join("absent.txt")),
            Err(ContextorError::Config(_))
        ));
    }

    #[test]
    fn context_joins_ranked_chunks() {
        let hits: Vec<ScoredDocument> = ["first", "  ", "second"]
            .iter()
            .enumerate()
            .map(|(i, t)| ScoredDocument {
                document: Document::from_text(*t),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect();
        assert_eq!(build_context(&hits), "first\n\nsecond");
    }
}
