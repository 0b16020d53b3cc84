use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the embedding collaborator.
pub enum EmbeddingError {
    /// The embedding service could not be reached.
    #[error("embedding request to '{url}' failed: {message}")]
    RequestFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("embedding service returned status {status}: {message}")]
    BadStatus {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed embedding response: {reason}")]
    MalformedResponse {
        /// Failure detail.
        reason: String,
    },

    /// The service returned a different number of vectors than requested.
    #[error("embedding count mismatch: requested {requested}, received {received}")]
    CountMismatch {
        /// Inputs sent.
        requested: usize,
        /// Vectors received.
        received: usize,
    },
}
