//! RAG orchestration: readiness gate, retrieval, synthesis and ingestion.

use std::sync::Arc;

use ai_llm_service::FailureKind;
use chrono::{SecondsFormat, Utc};
use rag_store::{
    Document, EmbeddingIndex, KNOWLEDGE_BASE_CONTENT, Metadata, RagError, Retriever, TextChunker,
    meta_keys, prepare_documents,
};
use tracing::{debug, info, instrument, warn};

use crate::api_types::{RagStatus, SearchPreview};
use crate::error::{ContextorError, Result};
use crate::index_handle::IndexHandle;
use crate::synthesize::{AnswerOutcome, AnswerSynthesizer};

/// Reply when the collection is not initialized.
pub const NOT_LOADED_REPLY: &str =
    "The knowledge base is not loaded yet. Please upload documents first.";
/// Reply when retrieval found nothing relevant.
pub const NO_INFORMATION_REPLY: &str =
    "I don't have information about that in the knowledge base.";
/// User-safe reply for a classified provider failure.
pub const PROVIDER_FAILURE_REPLY: &str =
    "Sorry, I can't answer that right now. Please try again in a moment.";

/// Source name for texts added through [`RagOrchestrator::add_documents`].
const INLINE_SOURCE: &str = "inline";
/// Length of search previews, in chars.
const PREVIEW_CHARS: usize = 200;

/// Structured outcome of [`RagOrchestrator::ask_reply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RagReply {
    Answer(String),
    NotLoaded,
    NoInformation,
    ProviderFailure(FailureKind),
}

impl RagReply {
    /// User-facing text; non-answers become the fixed replies.
    pub fn into_text(self) -> String {
        match self {
            RagReply::Answer(text) => text,
            RagReply::NotLoaded => NOT_LOADED_REPLY.to_string(),
            RagReply::NoInformation => NO_INFORMATION_REPLY.to_string(),
            RagReply::ProviderFailure(_) => PROVIDER_FAILURE_REPLY.to_string(),
        }
    }
}

/// Coordinates the index handle, retriever and synthesizer for one collection.
pub struct RagOrchestrator {
    handle: Arc<IndexHandle>,
    index: Arc<dyn EmbeddingIndex>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    chunker: TextChunker,
}

impl RagOrchestrator {
    pub fn new(
        handle: Arc<IndexHandle>,
        index: Arc<dyn EmbeddingIndex>,
        retriever: Retriever,
        synthesizer: AnswerSynthesizer,
        chunker: TextChunker,
    ) -> Self {
        Self {
            handle,
            index,
            retriever,
            synthesizer,
            chunker,
        }
    }

    pub fn collection(&self) -> &str {
        self.handle.collection()
    }

    /// Answers from the knowledge base, rendered as text.
    pub async fn ask(&self, question: &str) -> Result<String> {
        Ok(self.ask_reply(question).await?.into_text())
    }

    /// Answers from the knowledge base.
    ///
    /// Not initialized → `NotLoaded` without touching the index or the model.
    ///
    /// # Errors
    /// Blank questions, index failures and unclassified provider failures.
    /// Classified embedding or generation failures become `ProviderFailure`.
    #[instrument(skip_all, fields(collection = %self.collection()))]
    pub async fn ask_reply(&self, question: &str) -> Result<RagReply> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ContextorError::InvalidInput("question is empty".into()));
        }
        if !self.handle.is_ready().await {
            info!("knowledge base not loaded");
            return Ok(RagReply::NotLoaded);
        }

        let hits = match self.retriever.search(self.collection(), question).await {
            Ok(hits) => hits,
            Err(e) => {
                let err = ContextorError::from(e);
                return match err.failure_kind() {
                    Some(kind) => {
                        warn!(?kind, error = %err, "query embedding failed");
                        Ok(RagReply::ProviderFailure(kind))
                    }
                    None => Err(err),
                };
            }
        };
        debug!(hits = hits.len(), top = hits.first().map(|h| h.score), "retrieval done");

        let reply = match self.synthesizer.synthesize(question, &hits).await? {
            AnswerOutcome::Grounded(text) => RagReply::Answer(text),
            AnswerOutcome::NoInformation => RagReply::NoInformation,
            AnswerOutcome::ProviderError(kind) => RagReply::ProviderFailure(kind),
        };
        Ok(reply)
    }

    /// Stores each text as one document. Duplicates accumulate.
    ///
    /// Returns the number of documents written.
    pub async fn add_documents(&self, texts: &[String]) -> Result<usize> {
        if texts.is_empty() {
            return Err(ContextorError::InvalidInput("no documents given".into()));
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(ContextorError::InvalidInput("documents must not be blank".into()));
        }

        let ingested_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let docs: Vec<Document> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mut meta = Metadata::new();
                meta.insert(meta_keys::SOURCE.into(), INLINE_SOURCE.into());
                meta.insert(meta_keys::CHUNK_INDEX.into(), i.into());
                meta.insert(meta_keys::INGESTED_AT.into(), ingested_at.as_str().into());
                meta.insert(meta_keys::CONTENT_TYPE.into(), KNOWLEDGE_BASE_CONTENT.into());
                Document::new(text.trim(), meta)
            })
            .collect();

        self.store(&docs).await
    }

    /// Upload pipeline: normalize → chunk → upsert. Returns the chunk count.
    #[instrument(skip_all, fields(source = %source, len = text.len()))]
    pub async fn ingest_text(&self, source: &str, text: &str) -> Result<usize> {
        let docs = prepare_documents(&self.chunker, source, text)?;
        self.store(&docs).await
    }

    /// Clears readiness and probes the collection again. Returns the new readiness.
    pub async fn reinitialize(&self) -> bool {
        info!(collection = %self.collection(), "reinitializing index handle");
        self.handle.reinitialize().await
    }

    /// Empties the collection (keeping it) and marks it not loaded.
    ///
    /// Returns how many records were removed; an absent collection counts as empty.
    pub async fn clear_collection(&self) -> Result<usize> {
        let removed = match self.index.clear(self.collection()).await {
            Ok(n) => n,
            Err(RagError::CollectionNotFound(_)) => 0,
            Err(e) => return Err(e.into()),
        };
        self.handle.mark_not_ready().await;
        warn!(collection = %self.collection(), removed, "knowledge base cleared");
        Ok(removed)
    }

    /// Read-only diagnostics. Never fails; unreachable parts are reported as such.
    pub async fn status(&self) -> RagStatus {
        let state = self.handle.snapshot().await;
        let reachable = self.index.health_check().await;

        let (document_count, index_version) = if reachable {
            let count = match self.index.count(self.collection()).await {
                Ok(n) => Some(n),
                Err(RagError::CollectionNotFound(_)) => Some(0),
                Err(e) => {
                    warn!(error = %e, "document count unavailable");
                    None
                }
            };
            (count, self.index.version().await.ok())
        } else {
            (None, None)
        };

        RagStatus {
            collection: self.collection().to_string(),
            initialized: state.ready,
            index_reachable: reachable,
            document_count,
            index_version,
            last_probe_at: state.last_probe_at,
            last_error: state.last_error,
        }
    }

    /// Top-k hits for `query` with short previews. Ignores readiness.
    pub async fn test_search(&self, query: &str) -> Result<Vec<SearchPreview>> {
        let hits = self.retriever.search(self.collection(), query).await?;
        Ok(hits
            .into_iter()
            .map(|h| SearchPreview {
                score: h.score,
                source: h.document.source().map(str::to_string),
                chunk_index: h.document.chunk_index(),
                preview: preview(h.document.content()),
            })
            .collect())
    }

    async fn store(&self, docs: &[Document]) -> Result<usize> {
        let written = self.index.upsert(self.collection(), docs).await?;
        self.handle.mark_ready().await;
        info!(collection = %self.collection(), written, "knowledge base updated");
        Ok(written)
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().nth(PREVIEW_CHARS).is_some() {
        out.push('…');
    }
    out
}
