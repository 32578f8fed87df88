//! Shared LLM access for the backend: provider clients (OpenAI, Ollama),
//! grounded/general/embedding profiles, a classified error taxonomy,
//! health probes and a workspace log layer.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use error_handler::{AiLlmError, FailureKind};
pub use service_profiles::{ChatProfile, LlmServiceProfiles};
