use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::types::ExtractedDocument;
use super::{ExtractionError, Extractor};
use crate::pipeline::types::CandidateTender;
use crate::retry::{RetryPolicy, retry_with_backoff};

/// Extraction collaborator reached over HTTP.
///
/// The remote service drives the browser, downloads attachments and runs
/// the format parsers; this client only ships URLs out and text back.
pub struct HttpExtractor {
    client: reqwest::Client,
    extract_url: String,
    shutdown_url: String,
    retry: RetryPolicy,
}

impl HttpExtractor {
    /// Creates a client for the extraction service at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ExtractionError> {
        let base = base_url.into();
        let base = base.trim_end_matches('/');
        let extract_url = format!("{base}/extract");
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::RequestFailed {
                url: extract_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            extract_url,
            shutdown_url: format!("{base}/shutdown"),
            retry,
        })
    }

    async fn request(
        &self,
        tender: &CandidateTender,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let response = self
            .client
            .post(&self.extract_url)
            .json(&json!({ "url": tender.url, "source_type": tender.source_type }))
            .send()
            .await
            .map_err(|e| ExtractionError::RequestFailed {
                url: self.extract_url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractionError::BadStatus {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ExtractionError::MalformedResponse {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(
        &self,
        tender: &CandidateTender,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let document =
            retry_with_backoff("extraction", self.retry, || self.request(tender)).await?;

        debug!(
            tender = %tender.url,
            status = ?document.status,
            files = document.files.len(),
            "extraction finished"
        );
        Ok(document)
    }

    async fn shutdown(&self) -> Result<(), ExtractionError> {
        info!("releasing extraction service resources");
        // Best effort: a dead service is already shut down.
        let _ = self.client.post(&self.shutdown_url).send().await;
        Ok(())
    }
}
