use serde::{Deserialize, Serialize};

/// Body of `POST /knowledge/text`: one named text, or a batch of raw texts.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestTextRequest {
    /// Label stored with every chunk of `text`; defaults to `inline`.
    #[serde(default)]
    pub source: Option<String>,
    /// Document text, normalized and chunked before indexing.
    #[serde(default)]
    pub text: Option<String>,
    /// Raw texts, each stored as a single document.
    #[serde(default)]
    pub texts: Option<Vec<String>>,
}

/// Reply of both ingestion endpoints.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub collection: String,
    pub source: String,
    /// Number of documents (chunks) written to the index.
    pub stored: usize,
}
