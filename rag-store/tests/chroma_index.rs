//! `ChromaIndex` against an in-process fake of Chroma's v2 REST API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::future::BoxFuture;
use pretty_assertions::assert_eq;
use rag_store::{
    ChromaIndex, Document, EmbeddingIndex, EmbeddingsProvider, RagConfig, RagError, Retriever,
    TextChunker, prepare_documents,
};
use serde_json::{Value, json};

/* ------------------------- fake Chroma ------------------------- */

struct Record {
    id: String,
    embedding: Vec<f32>,
    document: String,
    metadata: Value,
}

struct Collection {
    id: String,
    name: String,
    records: Vec<Record>,
}

#[derive(Default)]
struct FakeChroma {
    collections: HashMap<String, Collection>,
    created: usize,
}

type Shared = Arc<Mutex<FakeChroma>>;
type ScopedPath = Path<(String, String, String)>;

fn collection_json(c: &Collection) -> Value {
    json!({ "id": c.id, "name": c.name, "metadata": { "hnsw:space": "cosine" } })
}

fn not_found(what: &str) -> Response {
    let body = json!({
        "error": "NotFoundError",
        "message": format!("Collection [{what}] does not exist"),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn by_id<'a>(st: &'a mut FakeChroma, id: &str) -> Option<&'a mut Collection> {
    st.collections.values_mut().find(|c| c.id == id)
}

async fn create(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut guard = s.lock().unwrap();
    let st = &mut *guard;
    if !st.collections.contains_key(&name) {
        st.created += 1;
        let c = Collection {
            id: format!("col-{}", st.created),
            name: name.clone(),
            records: Vec::new(),
        };
        st.collections.insert(name.clone(), c);
    }
    Json(collection_json(&st.collections[&name])).into_response()
}

async fn get_collection(State(s): State<Shared>, Path((_, _, name)): ScopedPath) -> Response {
    let st = s.lock().unwrap();
    match st.collections.get(&name) {
        Some(c) => Json(collection_json(c)).into_response(),
        None => not_found(&name),
    }
}

async fn delete_collection(State(s): State<Shared>, Path((_, _, name)): ScopedPath) -> Response {
    let mut st = s.lock().unwrap();
    match st.collections.remove(&name) {
        Some(_) => Json(json!({})).into_response(),
        None => not_found(&name),
    }
}

async fn upsert(
    State(s): State<Shared>,
    Path((_, _, id)): ScopedPath,
    Json(body): Json<Value>,
) -> Response {
    let mut st = s.lock().unwrap();
    let Some(c) = by_id(&mut st, &id) else {
        return not_found(&id);
    };
    let ids = body["ids"].as_array().cloned().unwrap_or_default();
    for (i, rid) in ids.iter().enumerate() {
        let embedding = body["embeddings"][i]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_f64).map(|x| x as f32).collect())
            .unwrap_or_default();
        c.records.push(Record {
            id: rid.as_str().unwrap_or_default().to_string(),
            embedding,
            document: body["documents"][i].as_str().unwrap_or_default().to_string(),
            metadata: body["metadatas"][i].clone(),
        });
    }
    Json(json!({})).into_response()
}

async fn query(
    State(s): State<Shared>,
    Path((_, _, id)): ScopedPath,
    Json(body): Json<Value>,
) -> Response {
    let mut st = s.lock().unwrap();
    let Some(c) = by_id(&mut st, &id) else {
        return not_found(&id);
    };
    let q: Vec<f32> = body["query_embeddings"][0]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_f64).map(|x| x as f32).collect())
        .unwrap_or_default();
    let n = body["n_results"].as_u64().unwrap_or(10) as usize;

    let mut scored: Vec<(f32, &Record)> = c
        .records
        .iter()
        .map(|r| {
            let dot: f32 = r.embedding.iter().zip(&q).map(|(a, b)| a * b).sum();
            (1.0 - dot, r)
        })
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(n);

    Json(json!({
        "ids": [scored.iter().map(|(_, r)| r.id.clone()).collect::<Vec<_>>()],
        "documents": [scored.iter().map(|(_, r)| r.document.clone()).collect::<Vec<_>>()],
        "metadatas": [scored.iter().map(|(_, r)| r.metadata.clone()).collect::<Vec<_>>()],
        "distances": [scored.iter().map(|(d, _)| *d).collect::<Vec<_>>()],
        "include": ["documents", "metadatas", "distances"],
    }))
    .into_response()
}

async fn get_records(State(s): State<Shared>, Path((_, _, id)): ScopedPath) -> Response {
    let mut st = s.lock().unwrap();
    match by_id(&mut st, &id) {
        Some(c) => {
            let ids: Vec<String> = c.records.iter().map(|r| r.id.clone()).collect();
            Json(json!({ "ids": ids, "include": [] })).into_response()
        }
        None => not_found(&id),
    }
}

async fn delete_records(
    State(s): State<Shared>,
    Path((_, _, id)): ScopedPath,
    Json(body): Json<Value>,
) -> Response {
    let mut st = s.lock().unwrap();
    let Some(c) = by_id(&mut st, &id) else {
        return not_found(&id);
    };
    let doomed: Vec<&str> = body["ids"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    c.records.retain(|r| !doomed.contains(&r.id.as_str()));
    Json(json!({})).into_response()
}

async fn count(State(s): State<Shared>, Path((_, _, id)): ScopedPath) -> Response {
    let mut st = s.lock().unwrap();
    match by_id(&mut st, &id) {
        Some(c) => Json(json!(c.records.len())).into_response(),
        None => not_found(&id),
    }
}

async fn spawn_fake_chroma() -> (String, Shared) {
    let state: Shared = Arc::default();
    let scope = "/api/v2/tenants/{tenant}/databases/{database}/collections";
    let app = Router::new()
        .route(
            "/api/v2/heartbeat",
            get(|| async { Json(json!({ "nanosecond heartbeat": 1 })) }),
        )
        .route("/api/v2/version", get(|| async { Json(json!("1.0.0")) }))
        .route(scope, post(create))
        .route(
            &format!("{scope}/{{collection}}"),
            get(get_collection).delete(delete_collection),
        )
        .route(&format!("{scope}/{{collection}}/upsert"), post(upsert))
        .route(&format!("{scope}/{{collection}}/query"), post(query))
        .route(&format!("{scope}/{{collection}}/get"), post(get_records))
        .route(&format!("{scope}/{{collection}}/delete"), post(delete_records))
        .route(&format!("{scope}/{{collection}}/count"), get(count))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

/* ------------------------- embedders ------------------------- */

/// Hashed bag-of-words, L2-normalized. Shared words → higher cosine similarity.
struct BagOfWords;

impl EmbeddingsProvider for BagOfWords {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move {
            let mut v = vec![0f32; 64];
            for word in text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
            {
                let h = word
                    .to_lowercase()
                    .bytes()
                    .fold(7u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
                v[(h % 64) as usize] += 1.0;
            }
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
            Ok(v.into_iter().map(|x| x / norm).collect())
        })
    }
}

struct BrokenEmbedder;

impl EmbeddingsProvider for BrokenEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async { Err(RagError::Config("embedder offline".into())) })
    }
}

fn index_at(url: &str, embedder: Arc<dyn EmbeddingsProvider>) -> ChromaIndex {
    let mut cfg = RagConfig::new_default(url, "dental-faq");
    cfg.timeout_secs = 2;
    ChromaIndex::new(&cfg, embedder).unwrap()
}

fn faq_docs() -> Vec<Document> {
    let chunker = TextChunker::default();
    [
        "We are open Monday to Friday. Opening hours are 9 to 5.",
        "Dental implants replace missing roots with titanium posts.",
        "Whitening uses a peroxide gel and takes about an hour.",
    ]
    .iter()
    .flat_map(|t| prepare_documents(&chunker, "faq.txt", t).unwrap())
    .collect()
}

/* ------------------------- tests ------------------------- */

#[tokio::test]
async fn upsert_creates_collection_once_and_accumulates() {
    let (url, state) = spawn_fake_chroma().await;
    let index = index_at(&url, Arc::new(BagOfWords));
    let docs = faq_docs();

    assert!(!index.collection_exists("dental-faq").await.unwrap());
    assert_eq!(index.upsert("dental-faq", &docs).await.unwrap(), 3);
    assert_eq!(index.upsert("dental-faq", &docs).await.unwrap(), 3);

    assert!(index.collection_exists("dental-faq").await.unwrap());
    assert_eq!(index.count("dental-faq").await.unwrap(), 6);
    assert_eq!(state.lock().unwrap().created, 1);
}

#[tokio::test]
async fn search_ranks_matching_chunk_first() {
    let (url, _state) = spawn_fake_chroma().await;
    let index = index_at(&url, Arc::new(BagOfWords));
    index.upsert("dental-faq", &faq_docs()).await.unwrap();

    let hits = index
        .similarity_search("dental-faq", "What are your opening hours?", 2)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert!(hits[0].document.content().contains("Opening hours"));
    assert!(hits[0].score >= hits[1].score);
    assert_eq!(hits[0].document.source(), Some("faq.txt"));
}

#[tokio::test]
async fn missing_collection_is_not_found_and_retrieves_empty() {
    let (url, _state) = spawn_fake_chroma().await;
    let index = Arc::new(index_at(&url, Arc::new(BagOfWords)));

    let err = index
        .similarity_search("dental-faq", "Do you offer implants?", 4)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::CollectionNotFound(_)));

    let retriever = Retriever::new(index, 4);
    let hits = retriever.search("dental-faq", "Do you offer implants?").await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn rejects_malformed_queries() {
    let (url, _state) = spawn_fake_chroma().await;
    let index = index_at(&url, Arc::new(BagOfWords));

    assert!(matches!(
        index.similarity_search("dental-faq", "hours", 0).await,
        Err(RagError::InvalidQuery(_))
    ));
    assert!(matches!(
        index.similarity_search("dental-faq", "   ", 4).await,
        Err(RagError::InvalidQuery(_))
    ));
}

#[tokio::test]
async fn clear_keeps_collection_and_delete_drops_it() {
    let (url, _state) = spawn_fake_chroma().await;
    let index = index_at(&url, Arc::new(BagOfWords));
    index.upsert("dental-faq", &faq_docs()).await.unwrap();

    assert_eq!(index.clear("dental-faq").await.unwrap(), 3);
    assert_eq!(index.count("dental-faq").await.unwrap(), 0);
    assert!(index.collection_exists("dental-faq").await.unwrap());

    index.delete_collection("dental-faq").await.unwrap();
    assert!(!index.collection_exists("dental-faq").await.unwrap());
}

#[tokio::test]
async fn embedding_failure_leaves_no_collection() {
    let (url, state) = spawn_fake_chroma().await;
    let index = index_at(&url, Arc::new(BrokenEmbedder));

    assert!(index.upsert("dental-faq", &faq_docs()).await.is_err());
    assert_eq!(state.lock().unwrap().created, 0);
}

#[tokio::test]
async fn unreachable_index_is_unavailable_not_missing() {
    // Bind and drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let index = Arc::new(index_at(&format!("http://{addr}"), Arc::new(BagOfWords)));
    assert!(!index.health_check().await);

    let err = index
        .similarity_search("dental-faq", "hours", 4)
        .await
        .unwrap_err();
    assert!(err.is_unavailable(), "got {err:?}");

    let retriever = Retriever::new(index, 4);
    assert!(retriever.search("dental-faq", "hours").await.is_err());
}

#[tokio::test]
async fn reports_server_version() {
    let (url, _state) = spawn_fake_chroma().await;
    let index = index_at(&url, Arc::new(BagOfWords));
    assert!(index.health_check().await);
    assert_eq!(index.version().await.unwrap(), "1.0.0");
}
