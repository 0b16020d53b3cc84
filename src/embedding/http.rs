use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::error::EmbeddingError;
use super::{Embedder, EmbeddingBatch};
use crate::ledger::TokenUsage;
use crate::retry::{RetryPolicy, retry_with_backoff};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dimension: usize,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingsDatum>,
    #[serde(default)]
    usage: Option<EmbeddingsUsage>,
}

#[derive(Deserialize)]
struct EmbeddingsDatum {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingsUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl HttpEmbedder {
    /// Creates an embedder for `url` with the given request timeout.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, EmbeddingError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::RequestFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url,
            model: model.into(),
            dimension,
            retry,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<EmbeddingsResponse, EmbeddingError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .map_err(|e| EmbeddingError::RequestFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::BadStatus {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse {
                reason: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch, EmbeddingError> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch {
                vectors: Vec::new(),
                usage: TokenUsage::default(),
            });
        }

        let parsed =
            retry_with_backoff("embeddings", self.retry, || self.request(texts)).await?;

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                requested: texts.len(),
                received: parsed.data.len(),
            });
        }

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.total_tokens.saturating_sub(u.prompt_tokens),
            })
            .unwrap_or_default();

        debug!(
            inputs = texts.len(),
            prompt_tokens = usage.prompt_tokens,
            "embedded batch"
        );

        Ok(EmbeddingBatch {
            vectors: parsed.data.into_iter().map(|d| d.embedding).collect(),
            usage,
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
