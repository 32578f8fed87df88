use contextor::SearchPreview;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct TestSearchResponse {
    pub query: String,
    pub results: Vec<SearchPreview>,
}

#[derive(Debug, Serialize)]
pub struct ReinitializeResponse {
    pub collection: String,
    pub initialized: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearCollectionResponse {
    pub collection: String,
    pub removed: usize,
}
