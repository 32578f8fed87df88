use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use contextor::ChatStack;
use thiserror::Error;

/// Default bind address.
pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:3000";
/// Default request body limit (10 MiB), large enough for typical PDF uploads.
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Transport settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// `API_ADDRESS`, e.g. `0.0.0.0:3000`.
    pub address: String,
    /// `UPLOAD_LIMIT_BYTES`, applied to every request body.
    pub upload_limit_bytes: usize,
}

impl ApiConfig {
    /// Reads `API_ADDRESS` and `UPLOAD_LIMIT_BYTES` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`ApiConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let address = get("API_ADDRESS")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());

        let upload_limit_bytes = match get("UPLOAD_LIMIT_BYTES") {
            Some(raw) if !raw.trim().is_empty() => {
                let n: usize = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidValue {
                        var: "UPLOAD_LIMIT_BYTES",
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })?;
                if n == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: "UPLOAD_LIMIT_BYTES",
                        value: raw,
                        reason: "must be greater than zero".into(),
                    });
                }
                n
            }
            _ => DEFAULT_UPLOAD_LIMIT_BYTES,
        };

        Ok(Self {
            address,
            upload_limit_bytes,
        })
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator, arbiter and general answerer.
    pub stack: ChatStack,
    /// LLM profiles, used here only for health probes.
    pub llm: Arc<LlmServiceProfiles>,
    /// Body limit applied by the router.
    pub upload_limit_bytes: usize,
}

impl AppState {
    pub fn new(stack: ChatStack, llm: Arc<LlmServiceProfiles>, upload_limit_bytes: usize) -> Self {
        Self {
            stack,
            llm,
            upload_limit_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = ApiConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.address, DEFAULT_API_ADDRESS);
        assert_eq!(cfg.upload_limit_bytes, DEFAULT_UPLOAD_LIMIT_BYTES);
    }

    #[test]
    fn explicit_values_win() {
        let cfg = ApiConfig::from_lookup(|k| match k {
            "API_ADDRESS" => Some("127.0.0.1:8080".into()),
            "UPLOAD_LIMIT_BYTES" => Some("2048".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.address, "127.0.0.1:8080");
        assert_eq!(cfg.upload_limit_bytes, 2048);
    }

    #[test]
    fn bad_limit_is_rejected() {
        for raw in ["lots", "0", "-5"] {
            let err = ApiConfig::from_lookup(|k| {
                (k == "UPLOAD_LIMIT_BYTES").then(|| raw.to_string())
            })
            .unwrap_err();
            assert!(err.to_string().contains("UPLOAD_LIMIT_BYTES"), "{raw}: {err}");
        }
    }
}
