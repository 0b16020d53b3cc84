//! Token-bounded document chunking for semantic indexing.
//!
//! Structure-aware splitting for canonical public notices, sentence-level
//! accumulation for everything else. Non-whitespace content is never
//! silently dropped: a single word over the budget is emitted as an
//! oversized chunk for the caller to handle.

pub mod canonical;
pub mod error;
pub mod generic;
pub mod tokens;


pub use canonical::{CanonicalSignals, detect};
pub use error::ChunkerError;
pub use tokens::TokenCounter;

use tracing::{debug, info};

/// Default chunk token budget.
pub const DEFAULT_MAX_TOKENS: usize = 480;

/// Default canonical-notice classification threshold. Hand-tuned for
/// behavioral compatibility; configuration, not law.
pub const DEFAULT_CANONICAL_THRESHOLD: u32 = 8;

/// Chunker knobs.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Token budget per chunk.
    pub max_tokens: usize,
    /// Detection score at or above which the structure-aware splitter runs.
    pub canonical_score_threshold: u32,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            canonical_score_threshold: DEFAULT_CANONICAL_THRESHOLD,
        }
    }
}

/// Token-bounded document chunker.
#[derive(Debug, Clone)]
pub struct Chunker {
    counter: TokenCounter,
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(counter: TokenCounter, config: ChunkerConfig) -> Self {
        Self { counter, config }
    }

    /// A chunker with whitespace token counting and default budgets.
    pub fn with_defaults() -> Self {
        Self::new(TokenCounter::whitespace(), ChunkerConfig::default())
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Splits `text` into segments under the configured token budget.
    ///
    /// Empty or whitespace-only input yields an empty sequence, not an
    /// error.
    pub fn chunk(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let signals = canonical::detect(text);
        if signals.is_canonical(self.config.canonical_score_threshold) {
            info!(
                score = signals.score,
                threshold = self.config.canonical_score_threshold,
                sections = ?signals.sections_found,
                sub_items = signals.sub_item_count,
                "canonical notice detected, using structure-aware chunking"
            );
            canonical::chunk_canonical(text, &self.counter, self.config.max_tokens)
        } else {
            debug!(
                score = signals.score,
                threshold = self.config.canonical_score_threshold,
                missing = ?signals.missing,
                "canonical signals insufficient, falling back to generic chunking"
            );
            generic::chunk_generic(text, &self.counter, self.config.max_tokens)
        }
    }

    /// Whether a produced chunk still exceeds the budget (an oversized
    /// atomic unit). The embedding caller is responsible for skipping or
    /// truncating these, and for logging when it does.
    pub fn is_oversized(&self, chunk: &str) -> Result<bool, ChunkerError> {
        Ok(self.counter.count(chunk)? > self.config.max_tokens)
    }

    /// Counts tokens with the configured backend.
    pub fn count_tokens(&self, text: &str) -> Result<usize, ChunkerError> {
        self.counter.count(text)
    }
}
