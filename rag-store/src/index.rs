//! Embedding index client: the seam between RAG logic and the vector store.
//!
//! [`EmbeddingIndex`] is object-safe so callers can hold `Arc<dyn EmbeddingIndex>`
//! and swap in a fake. [`ChromaIndex`] is the production implementation.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::chroma_facade::{ChromaFacade, CollectionInfo, UpsertBatch};
use crate::config::{DistanceKind, RagConfig};
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_documents;
use crate::errors::RagError;
use crate::record::{Document, RetrievalResult, ScoredDocument};

/// Operations the RAG layer needs from a vector index.
pub trait EmbeddingIndex: Send + Sync {
    /// Embeds and stores documents, creating the collection on first use.
    /// Every document gets a fresh id, so re-ingesting the same text adds
    /// new records. Returns the number of records written.
    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        docs: &'a [Document],
    ) -> BoxFuture<'a, Result<usize, RagError>>;

    /// Top-`k` documents by similarity to `query`, most similar first.
    /// Fails with `CollectionNotFound` when the collection is absent.
    fn similarity_search<'a>(
        &'a self,
        collection: &'a str,
        query: &'a str,
        k: usize,
    ) -> BoxFuture<'a, Result<RetrievalResult, RagError>>;

    /// `Ok(false)` when the collection is absent; errors only when the index is unreachable.
    fn collection_exists<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool, RagError>>;

    /// Removes all records but keeps the collection. Returns how many were removed.
    fn clear<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<usize, RagError>>;

    /// Drops the collection entirely.
    fn delete_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>>;

    /// Record count of an existing collection.
    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<usize, RagError>>;

    /// `true` when the index answers its heartbeat. Never fails.
    fn health_check(&self) -> BoxFuture<'_, bool>;

    /// Server version string.
    fn version(&self) -> BoxFuture<'_, Result<String, RagError>>;
}

/// Chroma-backed [`EmbeddingIndex`].
pub struct ChromaIndex {
    facade: ChromaFacade,
    embedder: Arc<dyn EmbeddingsProvider>,
    distance: DistanceKind,
    upsert_batch: usize,
    embedding_dim: Option<usize>,
    concurrency: usize,
}

impl ChromaIndex {
    /// Builds the client. Performs no network I/O.
    ///
    /// # Errors
    /// `RagError::Config` for an invalid configuration.
    pub fn new(cfg: &RagConfig, embedder: Arc<dyn EmbeddingsProvider>) -> Result<Self, RagError> {
        let facade = ChromaFacade::new(cfg)?;
        Ok(Self {
            facade,
            embedder,
            distance: cfg.distance,
            upsert_batch: cfg.upsert_batch,
            embedding_dim: cfg.embedding_dim,
            concurrency: cfg.embedding_concurrency,
        })
    }

    #[instrument(skip_all, fields(collection = %collection, docs = docs.len()))]
    async fn upsert_impl(&self, collection: &str, docs: &[Document]) -> Result<usize, RagError> {
        if docs.is_empty() {
            debug!("nothing to upsert");
            return Ok(0);
        }

        // Embed first: a provider failure must not leave an empty collection behind.
        let vectors =
            embed_documents(docs, self.embedder.as_ref(), self.embedding_dim, self.concurrency)
                .await?;
        let info = self
            .facade
            .get_or_create_collection(collection, self.distance)
            .await?;

        let ids: Vec<String> = docs.iter().map(|_| Uuid::new_v4().to_string()).collect();
        let mut written = 0usize;
        for ((id_chunk, vec_chunk), doc_chunk) in ids
            .chunks(self.upsert_batch)
            .zip(vectors.chunks(self.upsert_batch))
            .zip(docs.chunks(self.upsert_batch))
        {
            let batch = UpsertBatch {
                ids: id_chunk,
                embeddings: vec_chunk,
                documents: doc_chunk.iter().map(Document::content).collect(),
                metadatas: doc_chunk
                    .iter()
                    .map(|d| Some(d.metadata()).filter(|m| !m.is_empty()))
                    .collect(),
            };
            self.facade.upsert(&info, &batch).await?;
            written += id_chunk.len();
        }

        info!(collection, written, "documents upserted");
        Ok(written)
    }

    #[instrument(skip_all, fields(collection = %collection, k))]
    async fn search_impl(
        &self,
        collection: &str,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult, RagError> {
        if k == 0 {
            return Err(RagError::InvalidQuery("k must be > 0".into()));
        }
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery("query text is empty".into()));
        }

        let info = self.facade.get_collection(collection).await?;
        let qv = self.embedder.embed(query).await?;
        let hits = self.facade.query(&info, qv, k).await?;

        let mut out: RetrievalResult = hits
            .into_iter()
            .map(|h| ScoredDocument {
                score: self.distance.score(h.distance),
                document: Document::new(h.document, h.metadata),
            })
            .collect();
        out.sort_by(|a, b| b.score.total_cmp(&a.score));
        out.truncate(k);

        debug!(hits = out.len(), top = out.first().map(|h| h.score), "similarity search");
        Ok(out)
    }

    async fn exists_impl(&self, collection: &str) -> Result<bool, RagError> {
        match self.facade.get_collection(collection).await {
            Ok(_) => Ok(true),
            Err(RagError::CollectionNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn clear_impl(&self, collection: &str) -> Result<usize, RagError> {
        let info = self.facade.get_collection(collection).await?;
        let ids = self.facade.ids(&info).await?;
        if ids.is_empty() {
            return Ok(0);
        }
        for chunk in ids.chunks(self.upsert_batch) {
            self.facade.delete_ids(&info, chunk).await?;
        }
        warn!(collection, removed = ids.len(), "collection cleared");
        Ok(ids.len())
    }

    async fn count_impl(&self, collection: &str) -> Result<usize, RagError> {
        let info: CollectionInfo = self.facade.get_collection(collection).await?;
        self.facade.count(&info).await
    }
}

impl EmbeddingIndex for ChromaIndex {
    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        docs: &'a [Document],
    ) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(self.upsert_impl(collection, docs))
    }

    fn similarity_search<'a>(
        &'a self,
        collection: &'a str,
        query: &'a str,
        k: usize,
    ) -> BoxFuture<'a, Result<RetrievalResult, RagError>> {
        Box::pin(self.search_impl(collection, query, k))
    }

    fn collection_exists<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool, RagError>> {
        Box::pin(self.exists_impl(collection))
    }

    fn clear<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(self.clear_impl(collection))
    }

    fn delete_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(self.facade.delete_collection(collection))
    }

    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(self.count_impl(collection))
    }

    fn health_check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            match self.facade.heartbeat().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Chroma heartbeat failed");
                    false
                }
            }
        })
    }

    fn version(&self) -> BoxFuture<'_, Result<String, RagError>> {
        Box::pin(self.facade.version())
    }
}
