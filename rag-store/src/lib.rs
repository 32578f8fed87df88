//! Knowledge-base storage for RAG: chunking, embedding and retrieval over Chroma.
//!
//! This crate provides:
//! - [`normalize_text`] and [`TextChunker`] to turn uploads into overlapping chunks
//! - [`EmbeddingIndex`], implemented by [`ChromaIndex`] over Chroma's REST API
//! - [`Retriever`] for top-K context lookup
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod chroma_facade;
mod chunker;
mod config;
mod embed;
mod embed_pool;
mod errors;
mod index;
mod ingest;
mod normalize;
mod record;
mod retrieve;

pub use chunker::{
    ChunkSpan, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SEPARATORS, TextChunker,
};
pub use config::{DistanceKind, RagConfig};
pub use embed::EmbeddingsProvider;
pub use embed::service_embedder::ServiceEmbedder;
pub use errors::RagError;
pub use index::{ChromaIndex, EmbeddingIndex};
pub use ingest::{KNOWLEDGE_BASE_CONTENT, prepare_documents};
pub use normalize::normalize_text;
pub use record::{Document, MetaValue, Metadata, RetrievalResult, ScoredDocument, meta_keys};
pub use retrieve::{DEFAULT_TOP_K, Retriever};
