use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the LLM gateway.
pub enum GatewayError {
    /// The upstream provider failed or timed out.
    #[error("provider error during {operation}: {message}")]
    Provider {
        /// Operation label (for correlation).
        operation: String,
        /// Error message.
        message: String,
    },

    /// The model returned no usable content.
    #[error("empty response during {operation}")]
    EmptyResponse {
        /// Operation label.
        operation: String,
    },

    /// The model's output was not valid JSON.
    #[error("invalid JSON during {operation}: {reason}")]
    InvalidJson {
        /// Operation label.
        operation: String,
        /// Parse failure detail.
        reason: String,
    },

    /// The model's JSON did not match the expected schema. Treated as a
    /// stage failure at call sites, never a crash.
    #[error("schema violation: {reason}")]
    SchemaViolation {
        /// Mismatch detail.
        reason: String,
    },
}
