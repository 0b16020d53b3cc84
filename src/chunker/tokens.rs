use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::error::ChunkerError;

/// Token-counting backend for the chunker.
///
/// Production deployments load the tokenizer matching the embedding model so
/// chunk budgets line up with the model's real context window; tests and
/// tokenizer-less deployments fall back to whitespace counting.
#[derive(Clone)]
pub enum TokenCounter {
    /// Counts with a HuggingFace tokenizer.
    HuggingFace(Arc<tokenizers::Tokenizer>),
    /// Counts whitespace-separated words.
    Whitespace,
    /// Approximates subword tokenization: each word counts as
    /// `ceil(chars / n)` tokens. Tracks character-driven budgets when no
    /// tokenizer file is configured.
    CharsPerToken(usize),
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenCounter::HuggingFace(_) => f.write_str("TokenCounter::HuggingFace"),
            TokenCounter::Whitespace => f.write_str("TokenCounter::Whitespace"),
            TokenCounter::CharsPerToken(n) => write!(f, "TokenCounter::CharsPerToken({n})"),
        }
    }
}

impl TokenCounter {
    /// Loads a HuggingFace tokenizer from `path`.
    pub fn from_file(path: &Path) -> Result<Self, ChunkerError> {
        let tokenizer = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            ChunkerError::TokenizerLoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        info!(path = %path.display(), "tokenizer loaded for chunk budgeting");
        Ok(TokenCounter::HuggingFace(Arc::new(tokenizer)))
    }

    /// Whitespace-word counting backend.
    pub fn whitespace() -> Self {
        TokenCounter::Whitespace
    }

    /// Counts the tokens in `text`.
    pub fn count(&self, text: &str) -> Result<usize, ChunkerError> {
        match self {
            TokenCounter::HuggingFace(tokenizer) => {
                let encoding = tokenizer.encode(text, false).map_err(|e| {
                    ChunkerError::TokenizationFailed {
                        reason: e.to_string(),
                    }
                })?;
                Ok(encoding.get_ids().len())
            }
            TokenCounter::Whitespace => Ok(text.split_whitespace().count()),
            TokenCounter::CharsPerToken(n) => {
                let n = (*n).max(1);
                Ok(text
                    .split_whitespace()
                    .map(|w| w.chars().count().div_ceil(n))
                    .sum())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_count() {
        let counter = TokenCounter::whitespace();

        assert_eq!(counter.count("one two three").unwrap(), 3);
        assert_eq!(counter.count("  spaced\tout\nwords  ").unwrap(), 3);
        assert_eq!(counter.count("").unwrap(), 0);
        assert_eq!(counter.count("   ").unwrap(), 0);
    }

    #[test]
    fn test_chars_per_token_approximation() {
        let counter = TokenCounter::CharsPerToken(4);

        // "one"(1) + "two"(1) + "three"(2) = 4.
        assert_eq!(counter.count("one two three").unwrap(), 4);
        assert_eq!(counter.count(&"x".repeat(20)).unwrap(), 5);
        assert_eq!(counter.count("").unwrap(), 0);
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = TokenCounter::from_file(Path::new("/nonexistent/tokenizer.json")).unwrap_err();
        assert!(matches!(err, ChunkerError::TokenizerLoadFailed { .. }));
    }
}
