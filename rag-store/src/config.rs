//! Runtime and collection configuration.

use crate::errors::RagError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    #[default]
    Cosine,
    /// Inner product (useful for normalized vectors).
    Dot,
    /// Squared Euclidean distance (L2).
    Euclid,
}

impl DistanceKind {
    /// Parses `cosine | dot | ip | euclid | l2` (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, RagError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot" | "ip" => Ok(Self::Dot),
            "euclid" | "l2" => Ok(Self::Euclid),
            other => Err(RagError::Config(format!("unsupported distance '{other}'"))),
        }
    }

    /// Name of the space in Chroma's `hnsw:space` collection metadata.
    pub fn chroma_space(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Dot => "ip",
            Self::Euclid => "l2",
        }
    }

    /// Converts a raw index distance into a similarity score (higher is closer).
    pub fn score(self, distance: f32) -> f32 {
        match self {
            Self::Cosine | Self::Dot => 1.0 - distance,
            Self::Euclid => 1.0 / (1.0 + distance.max(0.0)),
        }
    }
}

/// Configuration for the Chroma-backed index.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Chroma HTTP endpoint, e.g. `http://localhost:8000`.
    pub chroma_url: String,
    /// Chroma tenant (`default_tenant`).
    pub tenant: String,
    /// Chroma database (`default_database`).
    pub database: String,
    /// Knowledge-base collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Upsert batch size.
    pub upsert_batch: usize,
    /// Per-request timeout against Chroma.
    pub timeout_secs: u64,
    /// Expected embedding dimension; checked on ingest when set.
    pub embedding_dim: Option<usize>,
    /// How many chunks are embedded concurrently during ingestion.
    pub embedding_concurrency: usize,
}

impl RagConfig {
    /// Creates a sane default config for a given Chroma endpoint and collection name.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            chroma_url: url.into(),
            tenant: "default_tenant".into(),
            database: "default_database".into(),
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            upsert_batch: 128,
            timeout_secs: 30,
            embedding_dim: None,
            embedding_concurrency: 4,
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        let url = self.chroma_url.trim();
        if url.is_empty() {
            return Err(RagError::Config("chroma_url is empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RagError::Config(format!(
                "chroma_url must start with http:// or https:// (got '{url}')"
            )));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        check_collection_name(&self.collection).map_err(RagError::Config)?;
        if self.tenant.trim().is_empty() || self.database.trim().is_empty() {
            return Err(RagError::Config("tenant and database must be set".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RagError::Config("upsert_batch must be > 0".into()));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::Config("embedding_concurrency must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        Ok(())
    }
}

/// Chroma collection names: 3-512 chars of `[A-Za-z0-9._-]`, starting and
/// ending with an alphanumeric. Names are used verbatim as URL path segments.
pub fn check_collection_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if !(3..=512).contains(&len) {
        return Err(format!("collection name '{name}' must be 3-512 characters long"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!("collection name '{name}' contains '{bad}'"));
    }
    let edges_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !edges_ok {
        return Err(format!(
            "collection name '{name}' must start and end with a letter or digit"
        ));
    }
    Ok(())
}
