use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::error::IndexError;
use super::model::{ChunkRecord, RetrievedChunk};
use crate::embedding::Embedder;
use crate::hashing::chunk_point_id;
use crate::ledger::TokenUsage;

/// Scoped vector storage and retrieval for extracted tender documents.
///
/// Everything is keyed by document id: chunks are stored under it, queries
/// are filtered to it, and deletion takes either one document or a whole
/// analysis namespace. Queries from one tender can never see another
/// tender's chunks.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Embeds and stores `chunks` under `document_id` within `namespace`.
    /// Returns the embedding usage consumed.
    async fn index_chunks(
        &self,
        namespace: &str,
        document_id: &str,
        chunks: Vec<ChunkRecord>,
    ) -> Result<TokenUsage, IndexError>;

    /// Retrieves up to `top_k` chunks of `document_id` similar to `query`,
    /// filtered by `score_threshold`.
    async fn query(
        &self,
        document_id: &str,
        query: &str,
        top_k: u64,
        score_threshold: f32,
    ) -> Result<Vec<RetrievedChunk>, IndexError>;

    /// Removes every chunk of one document.
    async fn delete_document(&self, document_id: &str) -> Result<(), IndexError>;

    /// Removes every chunk stored under `namespace` (operator cleanup).
    async fn delete_namespace(&self, namespace: &str) -> Result<(), IndexError>;
}

/// Qdrant-backed semantic index.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl QdrantIndex {
    /// Connects to `url` and ensures `collection` exists with the
    /// embedder's dimension.
    pub async fn connect(
        url: &str,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IndexError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| IndexError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let index = Self {
            client,
            collection: collection.into(),
            embedder,
        };
        index.ensure_collection().await?;
        Ok(index)
    }

    async fn ensure_collection(&self) -> Result<(), IndexError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| IndexError::CreateCollectionFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        if exists {
            return Ok(());
        }

        let vectors_config =
            VectorParamsBuilder::new(self.embedder.dimension() as u64, Distance::Cosine);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(vectors_config)
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| IndexError::CreateCollectionFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn delete_by_filter(&self, scope: &str, filter: Filter) -> Result<(), IndexError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(filter)
                    .wait(true),
            )
            .await
            .map_err(|e| IndexError::DeleteFailed {
                scope: scope.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}

#[async_trait]
impl SemanticIndex for QdrantIndex {
    async fn index_chunks(
        &self,
        namespace: &str,
        document_id: &str,
        chunks: Vec<ChunkRecord>,
    ) -> Result<TokenUsage, IndexError> {
        if chunks.is_empty() {
            return Ok(TokenUsage::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let batch = self.embedder.embed(&texts).await?;

        let points: Vec<PointStruct> = chunks
            .into_iter()
            .zip(batch.vectors)
            .map(|(chunk, vector)| {
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("namespace".to_string(), namespace.to_string().into());
                payload.insert("document_id".to_string(), document_id.to_string().into());
                payload.insert("chunk_index".to_string(), (chunk.chunk_index as i64).into());
                payload.insert("source_file".to_string(), chunk.source_file.into());
                payload.insert("text".to_string(), chunk.text.into());

                PointStruct::new(chunk_point_id(document_id, chunk.chunk_index), vector, payload)
            })
            .collect();

        debug!(
            document_id,
            points = points.len(),
            "upserting document chunks"
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| IndexError::UpsertFailed {
                document_id: document_id.to_string(),
                message: e.to_string(),
            })?;

        Ok(batch.usage)
    }

    async fn query(
        &self,
        document_id: &str,
        query: &str,
        top_k: u64,
        score_threshold: f32,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        let batch = self.embedder.embed(std::slice::from_ref(&query.to_string())).await?;
        let vector = batch.vectors.into_iter().next().ok_or_else(|| {
            IndexError::SearchFailed {
                document_id: document_id.to_string(),
                message: "embedder returned no vector for query".to_string(),
            }
        })?;

        let filter = Filter::must([Condition::matches(
            "document_id",
            document_id.to_string(),
        )]);

        let search = SearchPointsBuilder::new(&self.collection, vector, top_k)
            .filter(filter)
            .score_threshold(score_threshold)
            .with_payload(true);

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| IndexError::SearchFailed {
                document_id: document_id.to_string(),
                message: e.to_string(),
            })?;

        Ok(response
            .result
            .into_iter()
            .filter_map(RetrievedChunk::from_scored_point)
            .collect())
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), IndexError> {
        let filter = Filter::must([Condition::matches(
            "document_id",
            document_id.to_string(),
        )]);
        self.delete_by_filter(document_id, filter).await
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<(), IndexError> {
        let filter = Filter::must([Condition::matches("namespace", namespace.to_string())]);
        self.delete_by_filter(namespace, filter).await
    }
}
