//! Scoped vector storage for extracted tender documents.

pub mod error;
pub mod index;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;

#[cfg(test)]
mod tests;

pub use error::IndexError;
pub use index::{QdrantIndex, SemanticIndex};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSemanticIndex;
pub use model::{ChunkRecord, RetrievedChunk};

/// Default chunk-retrieval depth per criterion query.
pub const DEFAULT_TOP_K: u64 = 5;

/// Default similarity floor for retrieved chunks.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.25;
