//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata keys written on every ingested chunk.
pub mod meta_keys {
    pub const SOURCE: &str = "source";
    pub const CHUNK_INDEX: &str = "chunk_index";
    pub const CHUNK_START: &str = "chunk_start";
    pub const INGESTED_AT: &str = "ingested_at";
    pub const CONTENT_TYPE: &str = "content_type";
}

/// Scalar metadata value. Chroma only accepts scalars in metadata maps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Str(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Str(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<usize> for MetaValue {
    fn from(v: usize) -> Self {
        MetaValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

/// String-keyed scalar metadata, ordered for stable serialization.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A unit of knowledge: text content plus metadata. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    #[serde(default)]
    metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Document without metadata.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(content, Metadata::new())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// `source` metadata, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(meta_keys::SOURCE).and_then(MetaValue::as_str)
    }

    /// `chunk_index` metadata, if present.
    pub fn chunk_index(&self) -> Option<i64> {
        self.metadata
            .get(meta_keys::CHUNK_INDEX)
            .and_then(MetaValue::as_i64)
    }
}

/// A document paired with its similarity score (higher is closer).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Ranked retrieval output, most similar first. May be empty.
pub type RetrievalResult = Vec<ScoredDocument>;
