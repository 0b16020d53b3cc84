use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{SearchError, SearchQuery, TenderSearch};
use crate::pipeline::types::CandidateTender;
use crate::retry::{RetryPolicy, retry_with_backoff};

/// Search collaborator reached over HTTP.
pub struct HttpSearch {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl HttpSearch {
    /// Creates a client for the search service at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SearchError> {
        let url = format!("{}/search", base_url.into().trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::RequestFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { client, url, retry })
    }

    async fn request(&self, query: &SearchQuery) -> Result<Vec<CandidateTender>, SearchError> {
        let response = self
            .client
            .post(&self.url)
            .json(query)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::BadStatus {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::MalformedResponse {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl TenderSearch for HttpSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateTender>, SearchError> {
        let candidates = retry_with_backoff("search", self.retry, || self.request(query)).await?;

        debug!(
            phrase = %query.phrase,
            candidates = candidates.len(),
            "search returned candidates"
        );
        Ok(candidates)
    }
}
