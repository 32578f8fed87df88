//! Shared LLM service with three profiles: `grounded`, `general`, and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider, endpoint, model, key, sampling).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::config::default_config::profiles_from_env;
//! use ai_llm_service::service_profiles::{ChatProfile, LlmServiceProfiles};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::from_configs(profiles_from_env()?, Some(10))?);
//!
//! let txt = svc.generate(ChatProfile::General, "Hello", None).await?;
//! let emb = svc.embed("Ferris").await?;
//! println!("{txt} / dim = {}", emb.len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{
        default_config::ProfileConfigs, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Which chat profile a generation call runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatProfile {
    /// Near-deterministic answers over retrieved context.
    Grounded,
    /// Open-ended answers without retrieval context.
    General,
}

/// Shared service managing the **grounded**, **general** and **embedding** profiles.
pub struct LlmServiceProfiles {
    grounded: LlmModelConfig,
    general: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,

    health: HealthService,
}

impl std::fmt::Debug for LlmServiceProfiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmServiceProfiles")
            .field("grounded", &self.grounded.model)
            .field("general", &self.general.model)
            .field("embedding", &self.embedding.model)
            .finish()
    }
}

impl LlmServiceProfiles {
    /// Creates a new service from the three profiles.
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the health client cannot be built.
    pub fn new(
        grounded: LlmModelConfig,
        general: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Ok(Self {
            grounded,
            general,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Convenience constructor over [`ProfileConfigs`].
    pub fn from_configs(
        cfgs: ProfileConfigs,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Self::new(cfgs.grounded, cfgs.general, cfgs.embedding, health_timeout_secs)
    }

    /// Generates text with the selected chat profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if generation fails; use
    /// [`AiLlmError::failure_kind`] to classify.
    pub async fn generate(
        &self,
        profile: ChatProfile,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        let cfg = match profile {
            ChatProfile::Grounded => &self.grounded,
            ChatProfile::General => &self.general,
        };
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_for(cfg).await?.generate(prompt, system).await,
            LlmProvider::OpenAI => self.openai_for(cfg).await?.generate(prompt, system).await,
        }
    }

    /// Computes an embedding using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cfg = &self.embedding;
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_for(cfg).await?.embeddings(input).await,
            LlmProvider::OpenAI => self.openai_for(cfg).await?.embeddings(input).await,
        }
    }

    /// Returns a health snapshot for all distinct profiles.
    ///
    /// Profiles sharing provider, endpoint and model are probed once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list: Vec<LlmModelConfig> = Vec::with_capacity(3);
        for cfg in [&self.grounded, &self.general, &self.embedding] {
            let seen = list.iter().any(|c| {
                c.provider == cfg.provider && c.endpoint == cfg.endpoint && c.model == cfg.model
            });
            if !seen {
                list.push(cfg.clone());
            }
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(grounded, general, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig, &LlmModelConfig) {
        (&self.grounded, &self.general, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn ollama_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        debug!(model = %cfg.model, "creating Ollama client");
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn openai_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        debug!(model = %cfg.model, "creating OpenAI client");
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key identifying a client configuration.
///
/// Sampling options live inside each client, so profiles that differ only in
/// temperature or output cap get separate clients.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
    temperature_bits: Option<u32>,
    top_p_bits: Option<u32>,
    max_tokens: Option<u32>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
            temperature_bits: cfg.temperature.map(f32::to_bits),
            top_p_bits: cfg.top_p.map(f32::to_bits),
            max_tokens: cfg.max_tokens,
        }
    }
}
