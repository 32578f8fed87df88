//! Retrieval for answering: top-K context for a question.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::errors::RagError;
use crate::index::EmbeddingIndex;
use crate::record::RetrievalResult;

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Thin retrieval layer over an [`EmbeddingIndex`].
///
/// A missing collection is not an error here: it yields an empty result so
/// the caller can answer "no information" instead of failing.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn EmbeddingIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: Arc<dyn EmbeddingIndex>, top_k: usize) -> Self {
        Self {
            index,
            top_k: top_k.max(1),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Top-K documents for `question` with the configured `k`.
    pub async fn search(
        &self,
        collection: &str,
        question: &str,
    ) -> Result<RetrievalResult, RagError> {
        self.search_k(collection, question, self.top_k).await
    }

    /// Top-`k` documents for `question`. Empty when the collection is absent.
    ///
    /// # Errors
    /// `InvalidQuery`, `IndexUnavailable` and embedding failures pass through.
    pub async fn search_k(
        &self,
        collection: &str,
        question: &str,
        k: usize,
    ) -> Result<RetrievalResult, RagError> {
        trace!(collection, k, "retrieve");
        match self.index.similarity_search(collection, question, k).await {
            Ok(hits) => {
                debug!(collection, hits = hits.len(), "retrieved context");
                Ok(hits)
            }
            Err(RagError::CollectionNotFound(name)) => {
                debug!(collection = %name, "collection absent; empty context");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
