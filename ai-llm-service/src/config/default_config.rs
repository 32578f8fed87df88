//! Default LLM configs loaded strictly from environment variables.
//!
//! Three roles are configured for the selected provider:
//!
//! - **Grounded**  → answers constrained to retrieved context (temperature 0.0)
//! - **General**   → open-ended fallback answers (temperature 0.7, bounded length)
//! - **Embedding** → embedding generator for ingestion and retrieval
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = `openai` (default) | `ollama`
//! - `LLM_MAX_TOKENS`   = max tokens for general answers (default 1000)
//! - `LLM_TIMEOUT_SECS` = per-request timeout (default 60)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY`         (mandatory)
//! - `OPENAI_URL`             (default `https://api.openai.com`)
//! - `OPENAI_MODEL`           (default `gpt-4o`)
//! - `OPENAI_EMBEDDING_MODEL` (default `text-embedding-3-small`)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = chat model (mandatory)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt_u32, env_opt_u64, env_or, must_env},
};

/// Sampling temperature for grounded answers. Kept near-deterministic.
pub const GROUNDED_TEMPERATURE: f32 = 0.0;
/// Sampling temperature for general answers.
pub const GENERAL_TEMPERATURE: f32 = 0.7;
/// Default output cap for general answers.
pub const GENERAL_MAX_TOKENS: u32 = 1000;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// The three model profiles the service runs with.
#[derive(Debug, Clone)]
pub struct ProfileConfigs {
    pub grounded: LlmModelConfig,
    pub general: LlmModelConfig,
    pub embedding: LlmModelConfig,
}

/// Reads `LLM_KIND` and builds all three profiles for that provider.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
/// - any error from the provider-specific constructors
pub fn profiles_from_env() -> Result<ProfileConfigs, AiLlmError> {
    let kind = env_or("LLM_KIND", "openai");
    let provider =
        LlmProvider::parse(&kind).ok_or_else(|| ConfigError::UnsupportedProvider(kind.clone()))?;

    let (base, embedding_model) = match provider {
        LlmProvider::OpenAI => (
            base_openai()?,
            env_or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
        ),
        LlmProvider::Ollama => (base_ollama()?, must_env("EMBEDDING_MODEL")?),
    };
    let general_max = env_opt_u32("LLM_MAX_TOKENS")?.unwrap_or(GENERAL_MAX_TOKENS);

    let grounded = LlmModelConfig {
        temperature: Some(GROUNDED_TEMPERATURE),
        ..base.clone()
    };
    let general = LlmModelConfig {
        temperature: Some(GENERAL_TEMPERATURE),
        max_tokens: Some(general_max),
        ..base.clone()
    };
    let embedding = LlmModelConfig {
        model: embedding_model,
        temperature: None,
        ..base
    };

    for cfg in [&grounded, &general, &embedding] {
        cfg.validate()?;
    }

    Ok(ProfileConfigs {
        grounded,
        general,
        embedding,
    })
}

fn timeout_secs() -> Result<u64, AiLlmError> {
    Ok(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS))
}

fn base_openai() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: env_or("OPENAI_MODEL", "gpt-4o"),
        endpoint: env_or("OPENAI_URL", "https://api.openai.com"),
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(timeout_secs()?),
    })
}

fn base_ollama() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("OLLAMA_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(timeout_secs()?),
    })
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            port.trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{}", port.trim()));
        }
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}
