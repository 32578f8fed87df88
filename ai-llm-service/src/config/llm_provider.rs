/// Backend used for large language model (LLM) inference and embeddings.
///
/// Selected at startup via `LLM_KIND` (`openai` | `ollama`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// OpenAI-compatible REST API (`/v1/chat/completions`, `/v1/embeddings`).
    OpenAI,
}

impl LlmProvider {
    /// Parses the `LLM_KIND` value. Case-insensitive; `chatgpt` is accepted as an alias.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(LlmProvider::Ollama),
            "openai" | "chatgpt" => Some(LlmProvider::OpenAI),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!(LlmProvider::parse("OpenAI"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::parse(" ollama "), Some(LlmProvider::Ollama));
        assert_eq!(LlmProvider::parse("anthropic"), None);
    }
}
