//! Embedding executor with bounded concurrency and dimension checks.

use crate::{embed::EmbeddingsProvider, errors::RagError, record::Document};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

/// Embeds the content of every document, preserving input order.
///
/// - `expected_dim`: if `Some`, enforces this vector size; otherwise all
///   vectors must share the size of the first one.
/// - `concurrency`: maximum number of in-flight embedding calls.
///
/// # Errors
/// The first provider failure, or [`RagError::VectorSizeMismatch`].
pub async fn embed_documents(
    docs: &[Document],
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    info!(total = docs.len(), concurrency, "embedding documents");

    let pending: Vec<_> = docs.iter().map(|doc| provider.embed(doc.content())).collect();
    let vectors: Vec<Vec<f32>> = stream::iter(pending)
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let want = expected_dim.or_else(|| vectors.first().map(Vec::len));
    if let Some(want) = want {
        if let Some(bad) = vectors.iter().find(|v| v.len() != want) {
            return Err(RagError::VectorSizeMismatch {
                got: bad.len(),
                want,
            });
        }
        debug!(dim = want, "embeddings ready");
    }

    Ok(vectors)
}
