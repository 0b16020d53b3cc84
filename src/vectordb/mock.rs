use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::IndexError;
use super::index::SemanticIndex;
use super::model::{ChunkRecord, RetrievedChunk};
use crate::ledger::TokenUsage;

/// In-memory semantic index for tests.
///
/// Similarity is word-overlap (Jaccard) rather than a real embedding space:
/// deterministic, dependency-free, and good enough to exercise scoped
/// retrieval.
#[derive(Default)]
pub struct MockSemanticIndex {
    documents: RwLock<HashMap<String, StoredDocument>>,
}

#[derive(Default, Clone)]
struct StoredDocument {
    namespace: String,
    chunks: Vec<ChunkRecord>,
}

impl MockSemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks stored for `document_id`.
    pub fn chunk_count(&self, document_id: &str) -> usize {
        self.documents
            .read()
            .get(document_id)
            .map(|d| d.chunks.len())
            .unwrap_or(0)
    }

    /// Whether any chunks remain for `document_id`.
    pub fn contains_document(&self, document_id: &str) -> bool {
        self.chunk_count(document_id) > 0
    }
}

fn jaccard(a: &str, b: &str) -> f32 {
    let set_a: std::collections::HashSet<String> =
        a.to_lowercase().split_whitespace().map(String::from).collect();
    let set_b: std::collections::HashSet<String> =
        b.to_lowercase().split_whitespace().map(String::from).collect();

    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count() as f32;
    let union = set_a.union(&set_b).count() as f32;
    intersection / union
}

#[async_trait]
impl SemanticIndex for MockSemanticIndex {
    async fn index_chunks(
        &self,
        namespace: &str,
        document_id: &str,
        chunks: Vec<ChunkRecord>,
    ) -> Result<TokenUsage, IndexError> {
        let usage = TokenUsage {
            prompt_tokens: chunks
                .iter()
                .map(|c| c.text.split_whitespace().count() as u64)
                .sum(),
            completion_tokens: 0,
        };

        let mut documents = self.documents.write();
        let entry = documents
            .entry(document_id.to_string())
            .or_insert_with(|| StoredDocument {
                namespace: namespace.to_string(),
                chunks: Vec::new(),
            });
        entry.chunks.extend(chunks);

        Ok(usage)
    }

    async fn query(
        &self,
        document_id: &str,
        query: &str,
        top_k: u64,
        score_threshold: f32,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        let documents = self.documents.read();
        let Some(document) = documents.get(document_id) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<RetrievedChunk> = document
            .chunks
            .iter()
            .map(|chunk| RetrievedChunk {
                text: chunk.text.clone(),
                score: jaccard(query, &chunk.text),
                source_file: chunk.source_file.clone(),
                chunk_index: chunk.chunk_index,
            })
            .filter(|r| r.score >= score_threshold)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k as usize);

        Ok(results)
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), IndexError> {
        self.documents.write().remove(document_id);
        Ok(())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<(), IndexError> {
        self.documents
            .write()
            .retain(|_, doc| doc.namespace != namespace);
        Ok(())
    }
}
