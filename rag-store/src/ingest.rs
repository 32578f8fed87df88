//! Ingestion preparation: raw upload text → normalized, chunked documents.

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::chunker::TextChunker;
use crate::errors::RagError;
use crate::normalize::normalize_text;
use crate::record::{Document, Metadata, meta_keys};

/// `content_type` written on knowledge-base chunks.
pub const KNOWLEDGE_BASE_CONTENT: &str = "knowledge_base";

/// Normalizes `raw` and splits it into documents tagged with `source`,
/// `ingested_at` (RFC3339 UTC) and `content_type`.
///
/// # Errors
/// `RagError::InvalidInput` when nothing is left after normalization or the
/// source name is blank.
pub fn prepare_documents(
    chunker: &TextChunker,
    source: &str,
    raw: &str,
) -> Result<Vec<Document>, RagError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(RagError::InvalidInput("source name is empty".into()));
    }

    let text = normalize_text(raw);
    if text.is_empty() {
        return Err(RagError::InvalidInput(format!(
            "'{source}' contains no extractable text"
        )));
    }

    let mut base = Metadata::new();
    base.insert(meta_keys::SOURCE.into(), source.into());
    base.insert(
        meta_keys::INGESTED_AT.into(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true).into(),
    );
    base.insert(meta_keys::CONTENT_TYPE.into(), KNOWLEDGE_BASE_CONTENT.into());

    let docs = chunker.split_with(&text, &base)?;
    info!(
        source,
        raw_len = raw.len(),
        text_len = text.len(),
        chunks = docs.len(),
        "document prepared for ingestion"
    );
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MetaValue;

    #[test]
    fn tags_every_chunk() {
        let raw = "Q: Do you take insurance?\r\nA: Yes, most plans.\r\n\r\n".repeat(40);
        let docs = prepare_documents(&TextChunker::default(), "faq.txt", &raw).unwrap();

        assert!(docs.len() > 1);
        for (i, d) in docs.iter().enumerate() {
            assert_eq!(d.source(), Some("faq.txt"));
            assert_eq!(d.chunk_index(), Some(i as i64));
            assert_eq!(
                d.metadata().get(meta_keys::CONTENT_TYPE),
                Some(&MetaValue::Str("knowledge_base".into()))
            );
            assert!(d.metadata().contains_key(meta_keys::INGESTED_AT));
            assert!(!d.content().contains('\r'));
        }
    }

    #[test]
    fn rejects_blank_text_and_source() {
        let c = TextChunker::default();
        assert!(matches!(
            prepare_documents(&c, "a.txt", " \r\n\t "),
            Err(RagError::InvalidInput(_))
        ));
        assert!(matches!(
            prepare_documents(&c, "  ", "text"),
            Err(RagError::InvalidInput(_))
        ));
    }
}
