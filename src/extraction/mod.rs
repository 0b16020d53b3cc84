//! Extraction collaborator: a tender URL in, extracted file texts out.
//!
//! The pipeline never inspects file-format internals; it consumes plain
//! text plus metadata from whatever the extraction service produced
//! (PDF/OCR/Office parsing happens on the other side of this seam).
//! The service is a long-lived resource: acquired once per run and released
//! through [`Extractor::shutdown`] on every exit path.

pub mod http;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use http::HttpExtractor;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockExtractor;
pub use types::{ExtractedDocument, ExtractedFile, ExtractionStatus};

use async_trait::async_trait;
use thiserror::Error;

use crate::pipeline::types::CandidateTender;

#[derive(Debug, Error)]
/// Errors returned by the extraction collaborator.
pub enum ExtractionError {
    /// The extraction service could not be reached.
    #[error("extraction request to '{url}' failed: {message}")]
    RequestFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("extraction service returned status {status}: {message}")]
    BadStatus {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed extraction response: {reason}")]
    MalformedResponse {
        /// Failure detail.
        reason: String,
    },
}

/// Async extraction interface used by the stage runner.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extracts text and file metadata for one tender.
    async fn extract(&self, tender: &CandidateTender)
    -> Result<ExtractedDocument, ExtractionError>;

    /// Releases the service's long-lived resources (browser instances,
    /// worker pools). Called exactly once per run, on success and failure
    /// paths alike.
    async fn shutdown(&self) -> Result<(), ExtractionError>;
}
