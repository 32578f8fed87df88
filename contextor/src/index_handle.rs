//! Shared readiness state of the knowledge-base collection.
//!
//! Created once at startup and shared by reference. `ask` reads it on every
//! request; ingestion, reinitialize and clear mutate it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rag_store::EmbeddingIndex;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Snapshot of the collection readiness.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IndexState {
    /// The collection exists and may be queried.
    pub ready: bool,
    /// Time of the last probe that reached the index.
    pub last_probe_at: Option<DateTime<Utc>>,
    /// Error message of the last failed probe, cleared on success.
    pub last_error: Option<String>,
}

/// Readiness handle over one collection of an [`EmbeddingIndex`].
pub struct IndexHandle {
    index: Arc<dyn EmbeddingIndex>,
    collection: String,
    state: RwLock<IndexState>,
}

impl IndexHandle {
    /// Not ready until [`IndexHandle::initialize`] or a successful ingestion.
    pub fn new(index: Arc<dyn EmbeddingIndex>, collection: impl Into<String>) -> Self {
        Self {
            index,
            collection: collection.into(),
            state: RwLock::new(IndexState::default()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Probes the index for the collection without creating it.
    ///
    /// Never fails: an unreachable index leaves the handle not ready and
    /// records the error, so the service can start before the index does.
    /// Returns the resulting readiness.
    pub async fn initialize(&self) -> bool {
        let probe = self.index.collection_exists(&self.collection).await;
        let mut st = self.state.write().await;
        match probe {
            Ok(exists) => {
                st.ready = exists;
                st.last_probe_at = Some(Utc::now());
                st.last_error = None;
                info!(collection = %self.collection, exists, "index probe completed");
            }
            Err(e) => {
                st.ready = false;
                st.last_error = Some(e.to_string());
                warn!(collection = %self.collection, error = %e, "index probe failed");
            }
        }
        st.ready
    }

    /// Clears readiness, then probes again.
    pub async fn reinitialize(&self) -> bool {
        self.state.write().await.ready = false;
        self.initialize().await
    }

    pub async fn is_ready(&self) -> bool {
        self.state.read().await.ready
    }

    /// Marks the collection as present (after a successful upsert).
    pub async fn mark_ready(&self) {
        let mut st = self.state.write().await;
        st.ready = true;
        st.last_probe_at = Some(Utc::now());
        st.last_error = None;
    }

    /// Marks the collection as unusable (after it was emptied).
    pub async fn mark_not_ready(&self) {
        self.state.write().await.ready = false;
    }

    pub async fn snapshot(&self) -> IndexState {
        self.state.read().await.clone()
    }
}
