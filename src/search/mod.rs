//! Tender search collaborator: a phrase and source filters in, a
//! deduplicated candidate list out.

pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use http::HttpSearch;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSearch;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::types::CandidateTender;

/// Query handed to the search collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search phrase.
    pub phrase: String,
    /// Source identifiers to search (empty means all configured sources).
    #[serde(default)]
    pub sources: Vec<String>,
    /// Only tenders published after this instant.
    #[serde(default)]
    pub published_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
/// Errors returned by the search collaborator.
pub enum SearchError {
    /// The search service could not be reached.
    #[error("search request to '{url}' failed: {message}")]
    RequestFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("search service returned status {status}: {message}")]
    BadStatus {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed search response: {reason}")]
    MalformedResponse {
        /// Failure detail.
        reason: String,
    },
}

/// Async search interface used by the orchestrator.
#[async_trait]
pub trait TenderSearch: Send + Sync {
    /// Runs `query` and returns deduplicated candidates.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateTender>, SearchError>;
}
