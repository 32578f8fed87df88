//! RAG answering pipeline over `rag-store` and `ai-llm-service`.
//!
//! Public surface:
//! - [`RagOrchestrator`]: readiness gate, retrieval + grounded synthesis, ingestion, diagnostics
//! - [`ChatArbiter`]: knowledge base first, general model when the answer is missing or weak
//! - [`GeneralAnswerer`]: direct answers without retrieval
//! - [`ChatStack::build`]: wires all of the above from [`ContextorConfig`]

pub mod arbiter;
pub mod cfg;
mod error;
pub mod general;
pub mod index_handle;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod synthesize;

mod api_types;

use std::sync::Arc;

use ai_llm_service::{ChatProfile, LlmServiceProfiles};
use rag_store::{ChromaIndex, EmbeddingIndex, Retriever, ServiceEmbedder, TextChunker};
use tracing::info;

pub use api_types::{AnswerSource, ChatAnswer, FallbackReason, RagStatus, SearchPreview};
pub use arbiter::{ChatArbiter, LowConfidenceDetector};
pub use cfg::ContextorConfig;
pub use error::{ContextorError, Result};
pub use general::GeneralAnswerer;
pub use index_handle::{IndexHandle, IndexState};
pub use llm::{ChatModel, ProfileChat};
pub use orchestrator::{RagOrchestrator, RagReply};
pub use prompt::PromptTemplate;
pub use synthesize::{AnswerOutcome, AnswerSynthesizer};

/// The wired answering components, shared by the HTTP layer.
#[derive(Clone)]
pub struct ChatStack {
    pub orchestrator: Arc<RagOrchestrator>,
    pub arbiter: Arc<ChatArbiter>,
    pub general: Arc<GeneralAnswerer>,
}

impl ChatStack {
    /// Builds the production stack (Chroma index, service-backed models) and
    /// probes the collection once.
    ///
    /// # Errors
    /// Invalid configuration or an unreadable prompt template. An unreachable
    /// index is not an error; the collection simply starts not loaded.
    pub async fn build(cfg: &ContextorConfig, svc: Arc<LlmServiceProfiles>) -> Result<Self> {
        let template = PromptTemplate::load(&cfg.prompt_template_path)?;
        let embedder = Arc::new(ServiceEmbedder::new(svc.clone(), cfg.rag.embedding_dim));
        let index: Arc<dyn EmbeddingIndex> = Arc::new(ChromaIndex::new(&cfg.rag, embedder)?);

        let stack = Self::from_parts(
            cfg,
            index,
            Arc::new(ProfileChat::new(svc.clone(), ChatProfile::Grounded)),
            Arc::new(ProfileChat::new(svc, ChatProfile::General)),
            template,
        )?;

        let ready = stack.orchestrator.reinitialize().await;
        info!(collection = %cfg.rag.collection, ready, "chat stack ready");
        Ok(stack)
    }

    /// Wires the components over explicit parts. Performs no I/O.
    pub fn from_parts(
        cfg: &ContextorConfig,
        index: Arc<dyn EmbeddingIndex>,
        grounded: Arc<dyn ChatModel>,
        general: Arc<dyn ChatModel>,
        template: PromptTemplate,
    ) -> Result<Self> {
        let chunker = TextChunker::new(cfg.chunk_size, cfg.chunk_overlap)?;
        let handle = Arc::new(IndexHandle::new(index.clone(), cfg.rag.collection.clone()));
        let retriever = Retriever::new(index.clone(), cfg.top_k);
        let synthesizer = AnswerSynthesizer::new(grounded, template);

        let orchestrator = Arc::new(RagOrchestrator::new(
            handle,
            index,
            retriever,
            synthesizer,
            chunker,
        ));
        let general = Arc::new(GeneralAnswerer::new(general));
        let detector =
            LowConfidenceDetector::new(&cfg.no_info_phrases, cfg.low_confidence_min_chars);
        let arbiter = Arc::new(ChatArbiter::new(
            orchestrator.clone(),
            general.clone(),
            detector,
        ));

        Ok(Self {
            orchestrator,
            arbiter,
            general,
        })
    }
}
