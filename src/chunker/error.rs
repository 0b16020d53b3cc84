use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the token-bounded chunker.
pub enum ChunkerError {
    /// The tokenizer file could not be loaded.
    #[error("failed to load tokenizer from '{path}': {reason}")]
    TokenizerLoadFailed {
        /// Tokenizer file path.
        path: PathBuf,
        /// Load failure detail.
        reason: String,
    },

    /// Tokenization of a text segment failed.
    #[error("tokenization failed: {reason}")]
    TokenizationFailed {
        /// Failure detail.
        reason: String,
    },
}
