//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use rag_store::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_TOP_K, DistanceKind, RagConfig,
};

use crate::arbiter::{DEFAULT_LOW_CONFIDENCE_MIN_CHARS, default_no_info_phrases};
use crate::error::{ContextorError, Result};

/// Default location of the grounded-answer instruction template.
pub const DEFAULT_PROMPT_PATH: &str = "prompts/grounded_answer.txt";

/// Config bag for the answering pipeline. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    /// Chroma endpoint, collection and ingestion knobs.
    pub rag: RagConfig,

    // Retrieval / chunking
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,

    // Answering
    pub prompt_template_path: PathBuf,
    pub no_info_phrases: Vec<String>,
    pub low_confidence_min_chars: usize,
}

impl ContextorConfig {
    /// Build from environment variables with sensible defaults.
    ///
    /// | var                        | default                        |
    /// |----------------------------|--------------------------------|
    /// | `CHROMA_URL`               | `http://localhost:8000`        |
    /// | `CHROMA_TENANT`            | `default_tenant`               |
    /// | `CHROMA_DATABASE`          | `default_database`             |
    /// | `CHROMA_COLLECTION`        | `dental-faq`                   |
    /// | `CHROMA_DISTANCE`          | `cosine`                       |
    /// | `CHROMA_UPSERT_BATCH`      | `128`                          |
    /// | `CHROMA_TIMEOUT_SECS`      | `30`                           |
    /// | `EMBEDDING_DIM`            | unset (not enforced)           |
    /// | `EMBEDDING_CONCURRENCY`    | `4`                            |
    /// | `RAG_TOP_K`                | `4`                            |
    /// | `CHUNK_SIZE`               | `500`                          |
    /// | `CHUNK_OVERLAP`            | `50`                           |
    /// | `PROMPT_TEMPLATE_PATH`     | `prompts/grounded_answer.txt`  |
    /// | `NO_INFO_PHRASES`          | built-in list, `\|`-separated  |
    /// | `LOW_CONFIDENCE_MIN_CHARS` | `20`                           |
    ///
    /// # Errors
    /// `ContextorError::Config` when a value does not parse or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`ContextorConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&get);

        let rag = RagConfig {
            chroma_url: vars.string("CHROMA_URL", "http://localhost:8000"),
            tenant: vars.string("CHROMA_TENANT", "default_tenant"),
            database: vars.string("CHROMA_DATABASE", "default_database"),
            collection: vars.string("CHROMA_COLLECTION", "dental-faq"),
            distance: DistanceKind::parse(&vars.string("CHROMA_DISTANCE", "cosine"))?,
            upsert_batch: vars.parse("CHROMA_UPSERT_BATCH", 128usize)?,
            timeout_secs: vars.parse("CHROMA_TIMEOUT_SECS", 30u64)?,
            embedding_dim: vars.parse_opt("EMBEDDING_DIM")?,
            embedding_concurrency: vars.parse("EMBEDDING_CONCURRENCY", 4usize)?,
        };
        rag.validate()?;

        let no_info_phrases = match vars.get("NO_INFO_PHRASES") {
            Some(raw) => split_phrases(&raw),
            None => default_no_info_phrases(),
        };

        let cfg = Self {
            rag,
            top_k: vars.parse("RAG_TOP_K", DEFAULT_TOP_K)?,
            chunk_size: vars.parse("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: vars.parse("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            prompt_template_path: PathBuf::from(
                vars.string("PROMPT_TEMPLATE_PATH", DEFAULT_PROMPT_PATH),
            ),
            no_info_phrases,
            low_confidence_min_chars: vars
                .parse("LOW_CONFIDENCE_MIN_CHARS", DEFAULT_LOW_CONFIDENCE_MIN_CHARS)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the non-index knobs.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(ContextorError::Config("RAG_TOP_K must be > 0".into()));
        }
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ContextorError::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.no_info_phrases.is_empty() {
            return Err(ContextorError::Config(
                "NO_INFO_PHRASES must contain at least one phrase".into(),
            ));
        }
        Ok(())
    }
}

fn split_phrases(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Env lookup with the parse helpers used above. Blank values count as unset.
struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, k: &str) -> Option<String> {
        (self.0)(k)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, k: &str, dflt: &str) -> String {
        self.get(k).unwrap_or_else(|| dflt.to_string())
    }

    fn parse<T: FromStr>(&self, k: &str, dflt: T) -> Result<T> {
        Ok(self.parse_opt(k)?.unwrap_or(dflt))
    }

    fn parse_opt<T: FromStr>(&self, k: &str) -> Result<Option<T>> {
        match self.get(k) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| ContextorError::Config(format!("{k}: cannot parse '{v}'"))),
        }
    }
}
