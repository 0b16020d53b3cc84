use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
/// Errors returned by the semantic index.
pub enum IndexError {
    /// Could not connect to the Qdrant endpoint.
    #[error("failed to connect to Qdrant at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Collection creation failed.
    #[error("failed to create collection '{collection}': {message}")]
    CreateCollectionFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// Upsert failed.
    #[error("failed to upsert chunks for document '{document_id}': {message}")]
    UpsertFailed {
        /// Owning document id.
        document_id: String,
        /// Error message.
        message: String,
    },

    /// Search failed.
    #[error("failed to search document '{document_id}': {message}")]
    SearchFailed {
        /// Document id scope.
        document_id: String,
        /// Error message.
        message: String,
    },

    /// Delete failed.
    #[error("failed to delete '{scope}': {message}")]
    DeleteFailed {
        /// Document id or namespace being deleted.
        scope: String,
        /// Error message.
        message: String,
    },

    /// Embedding the texts failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
