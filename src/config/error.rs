use thiserror::Error;

#[derive(Debug, Error)]
/// Configuration loading/validation errors.
pub enum ConfigError {
    /// A numeric environment variable failed to parse.
    #[error("failed to parse {name}='{value}': {reason}")]
    ParseError {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure detail.
        reason: String,
    },

    /// Worker-pool width outside the supported range.
    #[error("invalid worker limit {value}: must be between 1 and {max}")]
    InvalidWorkerLimit {
        /// Configured value.
        value: usize,
        /// Supported ceiling.
        max: usize,
    },

    /// Filter batch size must be at least 1.
    #[error("invalid filter batch size {value}: must be at least 1")]
    InvalidBatchSize {
        /// Configured value.
        value: usize,
    },

    /// Chunk token budget must be at least 1.
    #[error("invalid chunk token budget {value}: must be at least 1")]
    InvalidTokenBudget {
        /// Configured value.
        value: usize,
    },

    /// The score base and weighted shares must sum to 1.0.
    #[error("score shares base={base} + weighted={weighted} must sum to 1.0")]
    InvalidScoreShares {
        /// Fixed base share.
        base: f64,
        /// Weight-distributed share.
        weighted: f64,
    },

    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar {
        /// Variable name.
        name: &'static str,
    },
}
