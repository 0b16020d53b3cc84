//! Embedding collaborator: text in, vectors out.
//!
//! The pipeline never runs models locally; embeddings come from an
//! OpenAI-compatible HTTP service. A deterministic hash-based mock backs
//! tests.

pub mod error;
pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::EmbeddingError;
pub use http::HttpEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;

use async_trait::async_trait;

use crate::ledger::TokenUsage;

/// Default embedding dimension (matches `text-embedding-3-small`).
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Vectors plus the usage the call consumed.
#[derive(Debug, Clone)]
pub struct EmbeddingBatch {
    /// One vector per input, in input order.
    pub vectors: Vec<Vec<f32>>,
    /// Token usage reported by the service.
    pub usage: TokenUsage,
}

/// Async embedding interface used by the semantic index.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds `texts`, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch, EmbeddingError>;

    /// Dimension of the produced vectors.
    fn dimension(&self) -> usize;
}
