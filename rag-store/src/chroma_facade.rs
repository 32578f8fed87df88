//! Thin adapter around the Chroma v2 REST API.
//!
//! All HTTP calls to Chroma live here, so the rest of the crate only sees
//! typed results and [`RagError`]. Endpoints (under `{url}/api/v2`):
//! - `GET  /heartbeat`, `GET /version`
//! - `POST /tenants/{t}/databases/{d}/collections` (get-or-create)
//! - `GET|DELETE .../collections/{name}`
//! - `POST .../collections/{id}/upsert | query | get | delete`, `GET .../count`
//!
//! Failure mapping: connect/timeout and 502/503/504 → `IndexUnavailable`;
//! 404 or a "does not exist" body on a collection call → `CollectionNotFound`;
//! anything else non-2xx → `IndexProtocol`.

use std::time::Duration;

use ai_llm_service::error_handler::make_snippet;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, trace, warn};

use crate::config::{DistanceKind, RagConfig, check_collection_name};
use crate::errors::RagError;
use crate::record::{Metadata, MetaValue};

/// Collection descriptor returned by Chroma.
#[derive(Clone, Debug, Deserialize)]
pub struct CollectionInfo {
    pub id: String,
    pub name: String,
}

/// One upsert request: parallel arrays, same length.
#[derive(Debug, Serialize)]
pub struct UpsertBatch<'a> {
    pub ids: &'a [String],
    pub embeddings: &'a [Vec<f32>],
    pub documents: Vec<&'a str>,
    /// `None` for documents without metadata (Chroma rejects empty maps).
    pub metadatas: Vec<Option<&'a Metadata>>,
}

/// A single nearest-neighbour hit, already flattened from Chroma's nested arrays.
#[derive(Clone, Debug)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub distance: f32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
}

/// A facade over Chroma's REST API for one tenant/database.
#[derive(Clone, Debug)]
pub struct ChromaFacade {
    client: reqwest::Client,
    base: String,
    scope: String,
}

impl ChromaFacade {
    /// Creates a new facade from the given configuration.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| RagError::Config(format!("http client: {e}")))?;

        let base = format!("{}/api/v2", cfg.chroma_url.trim().trim_end_matches('/'));
        let scope = format!(
            "{base}/tenants/{}/databases/{}",
            cfg.tenant.trim(),
            cfg.database.trim()
        );
        info!(%base, tenant = %cfg.tenant, database = %cfg.database, "Chroma facade ready");

        Ok(Self {
            client,
            base,
            scope,
        })
    }

    /// `GET /heartbeat`.
    pub async fn heartbeat(&self) -> Result<(), RagError> {
        let url = format!("{}/heartbeat", self.base);
        self.send(self.client.get(&url), &url, None).await?;
        Ok(())
    }

    /// `GET /version`, e.g. `"1.0.0"`.
    pub async fn version(&self) -> Result<String, RagError> {
        let url = format!("{}/version", self.base);
        let resp = self.send(self.client.get(&url), &url, None).await?;
        decode::<String>(resp).await
    }

    /// Looks up a collection by name.
    pub async fn get_collection(&self, name: &str) -> Result<CollectionInfo, RagError> {
        let url = self.collection_url(name)?;
        let resp = self.send(self.client.get(&url), &url, Some(name)).await?;
        decode(resp).await
    }

    /// Creates the collection, or returns the existing one with the same name.
    pub async fn get_or_create_collection(
        &self,
        name: &str,
        distance: DistanceKind,
    ) -> Result<CollectionInfo, RagError> {
        check_collection_name(name).map_err(RagError::InvalidInput)?;
        let url = format!("{}/collections", self.scope);
        let body = json!({
            "name": name,
            "metadata": { "hnsw:space": distance.chroma_space() },
            "get_or_create": true,
        });
        debug!(collection = name, space = distance.chroma_space(), "get-or-create collection");
        let resp = self
            .send(self.client.post(&url).json(&body), &url, Some(name))
            .await?;
        decode(resp).await
    }

    /// Drops a collection with all its records.
    pub async fn delete_collection(&self, name: &str) -> Result<(), RagError> {
        let url = self.collection_url(name)?;
        self.send(self.client.delete(&url), &url, Some(name)).await?;
        warn!(collection = name, "collection deleted");
        Ok(())
    }

    /// Upserts one batch into `collection`.
    pub async fn upsert(
        &self,
        collection: &CollectionInfo,
        batch: &UpsertBatch<'_>,
    ) -> Result<(), RagError> {
        let url = format!("{}/collections/{}/upsert", self.scope, collection.id);
        trace!(collection = %collection.name, size = batch.ids.len(), "upsert batch");
        self.send(self.client.post(&url).json(batch), &url, Some(&collection.name))
            .await?;
        Ok(())
    }

    /// Nearest-neighbour query for one embedding. Hits come back closest first.
    pub async fn query(
        &self,
        collection: &CollectionInfo,
        embedding: Vec<f32>,
        n_results: usize,
    ) -> Result<Vec<QueryHit>, RagError> {
        let url = format!("{}/collections/{}/query", self.scope, collection.id);
        let body = json!({
            "query_embeddings": [embedding],
            "n_results": n_results,
            "include": ["documents", "metadatas", "distances"],
        });
        let resp = self
            .send(self.client.post(&url).json(&body), &url, Some(&collection.name))
            .await?;
        let out: QueryResponse = decode(resp).await?;
        Ok(flatten_query(out))
    }

    /// All record ids in the collection.
    pub async fn ids(&self, collection: &CollectionInfo) -> Result<Vec<String>, RagError> {
        let url = format!("{}/collections/{}/get", self.scope, collection.id);
        let body = json!({ "include": [] });
        let resp = self
            .send(self.client.post(&url).json(&body), &url, Some(&collection.name))
            .await?;
        let out: GetResponse = decode(resp).await?;
        Ok(out.ids)
    }

    /// Deletes records by id.
    pub async fn delete_ids(
        &self,
        collection: &CollectionInfo,
        ids: &[String],
    ) -> Result<(), RagError> {
        let url = format!("{}/collections/{}/delete", self.scope, collection.id);
        let body = json!({ "ids": ids });
        self.send(self.client.post(&url).json(&body), &url, Some(&collection.name))
            .await?;
        Ok(())
    }

    /// Number of records in the collection.
    pub async fn count(&self, collection: &CollectionInfo) -> Result<usize, RagError> {
        let url = format!("{}/collections/{}/count", self.scope, collection.id);
        let resp = self
            .send(self.client.get(&url), &url, Some(&collection.name))
            .await?;
        decode(resp).await
    }

    /* --------------------- Internals --------------------- */

    /// `.../collections/{name}`. Names outside Chroma's charset would change
    /// the path, so they are rejected before any request is made.
    fn collection_url(&self, name: &str) -> Result<String, RagError> {
        check_collection_name(name).map_err(RagError::InvalidInput)?;
        Ok(format!("{}/collections/{name}", self.scope))
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        url: &str,
        collection: Option<&str>,
    ) -> Result<reqwest::Response, RagError> {
        let resp = req.send().await.map_err(|e| {
            warn!(%url, error = %e, "Chroma request failed");
            RagError::IndexUnavailable(format!("{url}: {e}"))
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, url, collection, &body))
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, RagError> {
    let text = resp
        .text()
        .await
        .map_err(|e| RagError::IndexUnavailable(format!("reading response body: {e}")))?;
    Ok(serde_json::from_str(&text)?)
}

fn status_error(status: StatusCode, url: &str, collection: Option<&str>, body: &str) -> RagError {
    let snippet = make_snippet(body);
    if let Some(name) = collection {
        let missing = status == StatusCode::NOT_FOUND
            || body.contains("does not exist")
            || body.contains("NotFoundError");
        if missing {
            debug!(collection = name, %status, "collection not found");
            return RagError::CollectionNotFound(name.to_string());
        }
    }
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            RagError::IndexUnavailable(format!("HTTP {status} at {url}: {snippet}"))
        }
        _ => RagError::IndexProtocol {
            status: status.as_u16(),
            url: url.to_string(),
            snippet,
        },
    }
}

/// Chroma answers per query embedding; only the first (single) query is used.
fn flatten_query(out: QueryResponse) -> Vec<QueryHit> {
    let ids = out.ids.into_iter().next().unwrap_or_default();
    let mut docs = out
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default()
        .into_iter();
    let mut metas = out
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default()
        .into_iter();
    let mut dists = out
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default()
        .into_iter();

    ids.into_iter()
        .map(|id| QueryHit {
            id,
            document: docs.next().flatten().unwrap_or_default(),
            metadata: metas.next().flatten().map(scalar_metadata).unwrap_or_default(),
            distance: dists.next().flatten().unwrap_or(f32::MAX),
        })
        .collect()
}

/// Keeps scalar entries; anything else Chroma may return is dropped.
fn scalar_metadata(raw: Map<String, Value>) -> Metadata {
    raw.into_iter()
        .filter_map(|(k, v)| serde_json::from_value::<MetaValue>(v).ok().map(|v| (k, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_first_query_row() {
        let raw = r#"{
            "ids": [["a", "b"]],
            "documents": [["first", null]],
            "metadatas": [[{"source": "faq.txt", "chunk_index": 0, "tags": ["x"]}, null]],
            "distances": [[0.1, 0.4]],
            "include": ["documents", "metadatas", "distances"]
        }"#;
        let hits = flatten_query(serde_json::from_str(raw).unwrap());

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document, "first");
        assert_eq!(hits[0].metadata.get("source"), Some(&MetaValue::Str("faq.txt".into())));
        assert!(!hits[0].metadata.contains_key("tags"));
        assert_eq!(hits[1].document, "");
        assert!(hits[1].metadata.is_empty());
        assert!((hits[1].distance - 0.4).abs() < 1e-6);
    }

    #[test]
    fn collection_urls_refuse_path_changing_names() {
        let facade =
            ChromaFacade::new(&RagConfig::new_default("http://localhost:8000", "dental-faq"))
                .unwrap();
        assert_eq!(
            facade.collection_url("dental-faq").unwrap(),
            "http://localhost:8000/api/v2/tenants/default_tenant/databases/default_database/collections/dental-faq"
        );
        for bad in ["faq/../../other", "faq?x=1", "faq#frag"] {
            assert!(
                matches!(facade.collection_url(bad), Err(RagError::InvalidInput(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn maps_statuses_to_error_kinds() {
        let url = "http://localhost:8000/api/v2/x";
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, url, Some("kb"), ""),
            RagError::CollectionNotFound(n) if n == "kb"
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, url, Some("kb"), "Collection kb does not exist."),
            RagError::CollectionNotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, url, None, ""),
            RagError::IndexProtocol { status: 404, .. }
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, url, Some("kb"), ""),
            RagError::IndexUnavailable(_)
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, url, Some("kb"), "boom"),
            RagError::IndexProtocol { status: 500, .. }
        ));
    }
}
