use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    /// End-user question in natural language.
    pub question: String,
}

/// Reply of `POST /chat/direct`.
#[derive(Debug, Serialize)]
pub struct DirectChatResponse {
    pub answer: String,
}
