//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested enums ([`ConfigError`],
//! [`HealthError`], [`ProviderError`]). Small helpers for reading/validating
//! environment variables return the unified [`Result<T>`] alias.
//!
//! Callers that need to branch on *why* a provider call failed use
//! [`AiLlmError::failure_kind`], which folds every transport/protocol detail into
//! one of three [`FailureKind`]s.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Health-check/connectivity/decoding errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Provider call failed (bad status, undecodable or empty payload).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Coarse failure category of a provider call.
///
/// Everything the answering pipeline needs to decide between a user-safe
/// message and escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Provider unreachable, timed out, or answered with a 5xx.
    Connectivity,
    /// HTTP 429 or an exhausted quota.
    RateLimit,
    /// Response could not be decoded or carried no completion text.
    Malformed,
}

impl AiLlmError {
    /// Classifies this error for callers that recover from provider failures.
    ///
    /// Returns `None` for errors that are not a provider malfunction
    /// (configuration mistakes, authentication, bad requests).
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AiLlmError::Config(_) => None,
            AiLlmError::Timeout(_) => Some(FailureKind::Connectivity),
            AiLlmError::HttpTransport(e) => Some(classify_transport(e)),
            AiLlmError::Health(HealthError::HttpStatus(http)) => classify_status(http),
            AiLlmError::Health(HealthError::Decode(_)) => Some(FailureKind::Malformed),
            AiLlmError::Health(_) => None,
            AiLlmError::Provider(p) => p.kind.failure_kind(),
        }
    }
}

fn classify_transport(e: &reqwest::Error) -> FailureKind {
    if e.is_decode() || e.is_body() {
        FailureKind::Malformed
    } else if let Some(status) = e.status() {
        if status == StatusCode::TOO_MANY_REQUESTS {
            FailureKind::RateLimit
        } else {
            FailureKind::Connectivity
        }
    } else {
        FailureKind::Connectivity
    }
}

fn classify_status(http: &HttpError) -> Option<FailureKind> {
    let snippet = http.snippet.to_lowercase();
    if http.status == StatusCode::TOO_MANY_REQUESTS
        || http.status == StatusCode::PAYMENT_REQUIRED
        || snippet.contains("insufficient_quota")
        || snippet.contains("rate limit")
    {
        return Some(FailureKind::RateLimit);
    }
    if http.status.is_server_error() || http.status == StatusCode::REQUEST_TIMEOUT {
        return Some(FailureKind::Connectivity);
    }
    None
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for provider health checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    /// The endpoint is empty or does not start with http/https.
    #[error("[AI LLM Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("[AI LLM Service] {0}")]
    HttpStatus(HttpError),

    /// Response payload could not be decoded as expected.
    #[error("[AI LLM Service] decode error: {0}")]
    Decode(String),
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Backend that produced a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
}

/// Non-2xx response details, with a trimmed body snippet.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    pub snippet: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// What went wrong inside a provider call.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ProviderErrorKind {
    InvalidProvider,
    MissingApiKey,
    InvalidEndpoint(String),
    HttpStatus(HttpError),
    Decode(String),
    /// Chat response had no `choices[].message.content`.
    EmptyChoices,
    /// Completion text was present but blank.
    EmptyCompletion,
}

impl ProviderErrorKind {
    fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ProviderErrorKind::HttpStatus(http) => classify_status(http),
            ProviderErrorKind::Decode(_)
            | ProviderErrorKind::EmptyChoices
            | ProviderErrorKind::EmptyCompletion => Some(FailureKind::Malformed),
            ProviderErrorKind::InvalidProvider
            | ProviderErrorKind::MissingApiKey
            | ProviderErrorKind::InvalidEndpoint(_) => None,
        }
    }
}

/// A failed call against a concrete provider.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider:?} provider error: {kind:?}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Trims a response body to a short, single-line snippet for logs/errors.
pub fn make_snippet(text: &str) -> String {
    text.chars()
        .take(240)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] if the variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Fetches an optional environment variable, treating blank values as unset.
pub fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u64`.
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the scheme is missing.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, body: &str) -> AiLlmError {
        ProviderError::new(
            Provider::OpenAI,
            ProviderErrorKind::HttpStatus(HttpError {
                status: StatusCode::from_u16(status).unwrap(),
                url: "http://llm/v1/chat/completions".into(),
                snippet: make_snippet(body),
            }),
        )
        .into()
    }

    #[test]
    fn too_many_requests_is_rate_limit() {
        assert_eq!(http(429, "").failure_kind(), Some(FailureKind::RateLimit));
    }

    #[test]
    fn quota_body_is_rate_limit() {
        let err = http(403, r#"{"error":{"code":"insufficient_quota"}}"#);
        assert_eq!(err.failure_kind(), Some(FailureKind::RateLimit));
    }

    #[test]
    fn server_errors_are_connectivity() {
        assert_eq!(http(503, "busy").failure_kind(), Some(FailureKind::Connectivity));
        assert_eq!(
            AiLlmError::Timeout(Duration::from_secs(1)).failure_kind(),
            Some(FailureKind::Connectivity)
        );
    }

    #[test]
    fn empty_completion_is_malformed() {
        let err: AiLlmError =
            ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyCompletion).into();
        assert_eq!(err.failure_kind(), Some(FailureKind::Malformed));
    }

    #[test]
    fn auth_and_config_failures_are_unclassified() {
        assert_eq!(http(401, "bad key").failure_kind(), None);
        let cfg: AiLlmError = ConfigError::MissingVar("OPENAI_API_KEY").into();
        assert_eq!(cfg.failure_kind(), None);
    }

    #[test]
    fn snippet_is_single_line_and_bounded() {
        let long = "a\nb".repeat(200);
        let s = make_snippet(&long);
        assert!(!s.contains('\n'));
        assert!(s.chars().count() <= 240);
    }
}
