//! Chat-model seam used by the synthesizer and the general answerer.

use std::sync::Arc;

use ai_llm_service::{AiLlmError, ChatProfile, LlmServiceProfiles};
use futures::future::BoxFuture;

/// One-shot text completion: optional system message plus a user prompt.
pub trait ChatModel: Send + Sync {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>>;
}

/// [`ChatModel`] bound to one profile of the shared LLM service.
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use ai_llm_service::{ChatProfile, LlmServiceProfiles};
/// # use ai_llm_service::config::default_config::profiles_from_env;
/// # use contextor::llm::{ChatModel, ProfileChat};
/// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let svc = Arc::new(LlmServiceProfiles::from_configs(profiles_from_env()?, None)?);
/// let chat = ProfileChat::new(svc, ChatProfile::General);
/// println!("{}", chat.complete("Hello!", Some("Be brief.")).await?);
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct ProfileChat {
    svc: Arc<LlmServiceProfiles>,
    profile: ChatProfile,
}

impl ProfileChat {
    pub fn new(svc: Arc<LlmServiceProfiles>, profile: ChatProfile) -> Self {
        Self { svc, profile }
    }
}

impl ChatModel for ProfileChat {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(self.svc.generate(self.profile, prompt, system))
    }
}
