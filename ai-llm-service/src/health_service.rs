//! Health probes for LLM backends (Ollama, OpenAI).
//!
//! - Ollama: `GET {endpoint}/api/tags`, model looked up in `models[].name`
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth, model looked up in `data[].id`
//!
//! [`HealthService::check`] never fails; errors become `ok = false` snapshots,
//! which is what a `/health` endpoint wants.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: Option<String>,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker reusing a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds, default 10).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Probes one config. Never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let start = Instant::now();
        match self.probe(cfg).await {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %cfg.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                warn!(
                    provider = ?cfg.provider,
                    endpoint = %cfg.endpoint,
                    error = %err,
                    "health probe failed"
                );
                HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string())
            }
        }
    }

    /// Probes several configs sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn probe(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let base = cfg.endpoint.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(HealthError::InvalidEndpoint(cfg.endpoint.clone()).into());
        }

        let url = match cfg.provider {
            LlmProvider::Ollama => format!("{base}/api/tags"),
            LlmProvider::OpenAI => format!("{base}/v1/models"),
        };
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
            .min(self.default_timeout);

        let mut req = self.client.get(&url).timeout(timeout);
        if let (LlmProvider::OpenAI, Some(key)) = (cfg.provider, cfg.api_key.as_deref()) {
            req = req.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let start = Instant::now();
        debug!(provider = ?cfg.provider, "GET {}", url);
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })
            .into());
        }

        let listing: ModelListing = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                return Ok(HealthStatus::new(
                    cfg,
                    true,
                    latency,
                    format!("reachable; model list not decodable: {e}"),
                ));
            }
        };

        let names = listing.names();
        let found = names.is_empty() || names.iter().any(|n| model_matches(n, &cfg.model));
        let message = if found {
            "healthy; model is available"
        } else {
            "reachable, but model not listed"
        };
        Ok(HealthStatus::new(cfg, found, latency, message))
    }
}

/// Union of the Ollama (`models[].name`) and OpenAI (`data[].id`) listings.
#[derive(Debug, Default, Deserialize)]
struct ModelListing {
    #[serde(default)]
    models: Vec<OllamaTag>,
    #[serde(default)]
    data: Vec<OpenAiModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiModel {
    id: String,
}

impl ModelListing {
    fn names(&self) -> Vec<&str> {
        self.models
            .iter()
            .map(|m| m.name.as_str())
            .chain(self.data.iter().map(|m| m.id.as_str()))
            .collect()
    }
}

/// Ollama lists `name:tag`; a configured model without a tag means `:latest`.
fn model_matches(listed: &str, configured: &str) -> bool {
    listed == configured || (!configured.contains(':') && listed == format!("{configured}:latest"))
}
