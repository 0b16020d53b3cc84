//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `TENDERSIFT_*` environment
//! variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::time::Duration;

/// Hard ceiling on the configurable worker-pool width.
pub const MAX_WORKER_LIMIT: usize = 75;

/// Pipeline configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `TENDERSIFT_*` overrides on top of
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Concurrent stage-runner ceiling. Default: `8`.
    pub worker_limit: usize,

    /// Candidates per batched AI-filter request. Default: `20`.
    pub filter_batch_size: usize,

    /// Token budget per document chunk. Default: `480`.
    pub chunk_max_tokens: usize,

    /// Chunks retrieved per criterion query. Default: `5`.
    pub retrieval_top_k: u64,

    /// Minimum similarity score for retrieved chunks. Default: `0.25`.
    pub retrieval_score_threshold: f32,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Vector collection name. Default: `tender_chunks`.
    pub collection_name: String,

    /// Chat model identifier passed to the inference client.
    /// Default: `gpt-4o-mini`.
    pub llm_model: String,

    /// Embedding service endpoint (OpenAI-compatible `/embeddings`).
    /// Default: `http://localhost:8081/v1/embeddings`.
    pub embedding_url: String,

    /// Embedding model identifier. Default: `text-embedding-3-small`.
    pub embedding_model: String,

    /// Extraction service endpoint. Default: `http://localhost:8090`.
    pub extraction_url: String,

    /// Search service endpoint. Default: `http://localhost:8091`.
    pub search_url: String,

    /// Per-request timeout for external calls. Default: `60s`.
    pub request_timeout: Duration,

    /// Attempts per external call (including the first). Default: `3`.
    pub retry_max_attempts: u32,

    /// Fixed delay before each retry. Default: `2s`.
    pub retry_base_delay: Duration,

    /// Detection score at or above which a document is treated as a
    /// canonical public notice. Default: `8`.
    pub canonical_score_threshold: u32,

    /// Fixed share of the relevance score. Default: `0.40`.
    pub score_base_share: f64,

    /// Weight-distributed share of the relevance score. Default: `0.60`.
    pub score_weighted_share: f64,

    /// Weight applied to criteria that omit one. Default: `3`.
    pub default_criterion_weight: u32,

    /// Optional HuggingFace tokenizer file for token counting; whitespace
    /// counting is used when unset.
    pub tokenizer_path: Option<std::path::PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_limit: 8,
            filter_batch_size: 20,
            chunk_max_tokens: 480,
            retrieval_top_k: 5,
            retrieval_score_threshold: 0.25,
            qdrant_url: "http://localhost:6334".to_string(),
            collection_name: "tender_chunks".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            embedding_url: "http://localhost:8081/v1/embeddings".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            extraction_url: "http://localhost:8090".to_string(),
            search_url: "http://localhost:8091".to_string(),
            request_timeout: Duration::from_secs(60),
            retry_max_attempts: 3,
            retry_base_delay: Duration::from_secs(2),
            canonical_score_threshold: 8,
            score_base_share: 0.40,
            score_weighted_share: 0.60,
            default_criterion_weight: 3,
            tokenizer_path: None,
        }
    }
}

impl Config {
    const ENV_WORKER_LIMIT: &'static str = "TENDERSIFT_WORKER_LIMIT";
    const ENV_FILTER_BATCH_SIZE: &'static str = "TENDERSIFT_FILTER_BATCH_SIZE";
    const ENV_CHUNK_MAX_TOKENS: &'static str = "TENDERSIFT_CHUNK_MAX_TOKENS";
    const ENV_RETRIEVAL_TOP_K: &'static str = "TENDERSIFT_RETRIEVAL_TOP_K";
    const ENV_QDRANT_URL: &'static str = "TENDERSIFT_QDRANT_URL";
    const ENV_COLLECTION_NAME: &'static str = "TENDERSIFT_COLLECTION_NAME";
    const ENV_LLM_MODEL: &'static str = "TENDERSIFT_LLM_MODEL";
    const ENV_EMBEDDING_URL: &'static str = "TENDERSIFT_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "TENDERSIFT_EMBEDDING_MODEL";
    const ENV_EXTRACTION_URL: &'static str = "TENDERSIFT_EXTRACTION_URL";
    const ENV_SEARCH_URL: &'static str = "TENDERSIFT_SEARCH_URL";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "TENDERSIFT_REQUEST_TIMEOUT_SECS";
    const ENV_RETRY_MAX_ATTEMPTS: &'static str = "TENDERSIFT_RETRY_MAX_ATTEMPTS";
    const ENV_TOKENIZER_PATH: &'static str = "TENDERSIFT_TOKENIZER_PATH";

    /// Loads configuration from environment variables (falling back to
    /// defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            worker_limit: Self::parse_from_env(Self::ENV_WORKER_LIMIT, defaults.worker_limit)?,
            filter_batch_size: Self::parse_from_env(
                Self::ENV_FILTER_BATCH_SIZE,
                defaults.filter_batch_size,
            )?,
            chunk_max_tokens: Self::parse_from_env(
                Self::ENV_CHUNK_MAX_TOKENS,
                defaults.chunk_max_tokens,
            )?,
            retrieval_top_k: Self::parse_from_env(
                Self::ENV_RETRIEVAL_TOP_K,
                defaults.retrieval_top_k,
            )?,
            qdrant_url: Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url),
            collection_name: Self::parse_string_from_env(
                Self::ENV_COLLECTION_NAME,
                defaults.collection_name,
            ),
            llm_model: Self::parse_string_from_env(Self::ENV_LLM_MODEL, defaults.llm_model),
            embedding_url: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_URL,
                defaults.embedding_url,
            ),
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            extraction_url: Self::parse_string_from_env(
                Self::ENV_EXTRACTION_URL,
                defaults.extraction_url,
            ),
            search_url: Self::parse_string_from_env(Self::ENV_SEARCH_URL, defaults.search_url),
            request_timeout: Duration::from_secs(Self::parse_from_env(
                Self::ENV_REQUEST_TIMEOUT_SECS,
                defaults.request_timeout.as_secs(),
            )?),
            retry_max_attempts: Self::parse_from_env(
                Self::ENV_RETRY_MAX_ATTEMPTS,
                defaults.retry_max_attempts,
            )?,
            tokenizer_path: Self::parse_optional_path_from_env(Self::ENV_TOKENIZER_PATH),
            retrieval_score_threshold: defaults.retrieval_score_threshold,
            retry_base_delay: defaults.retry_base_delay,
            canonical_score_threshold: defaults.canonical_score_threshold,
            score_base_share: defaults.score_base_share,
            score_weighted_share: defaults.score_weighted_share,
            default_criterion_weight: defaults.default_criterion_weight,
        })
    }

    /// Validates basic invariants. Called before any tender is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_limit == 0 || self.worker_limit > MAX_WORKER_LIMIT {
            return Err(ConfigError::InvalidWorkerLimit {
                value: self.worker_limit,
                max: MAX_WORKER_LIMIT,
            });
        }

        if self.filter_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize {
                value: self.filter_batch_size,
            });
        }

        if self.chunk_max_tokens == 0 {
            return Err(ConfigError::InvalidTokenBudget {
                value: self.chunk_max_tokens,
            });
        }

        if (self.score_base_share + self.score_weighted_share - 1.0).abs() > f64::EPSILON {
            return Err(ConfigError::InvalidScoreShares {
                base: self.score_base_share,
                weighted: self.score_weighted_share,
            });
        }

        Ok(())
    }

    /// Retry policy derived from the configured attempt count and delay.
    pub fn retry_policy(&self) -> crate::retry::RetryPolicy {
        crate::retry::RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: self.retry_base_delay,
            max_jitter: Duration::from_secs(3),
        }
    }

    fn parse_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::ParseError {
                name,
                value,
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_string_from_env(name: &'static str, default: String) -> String {
        env::var(name).unwrap_or(default)
    }

    fn parse_optional_path_from_env(name: &'static str) -> Option<std::path::PathBuf> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(std::path::PathBuf::from)
    }
}
