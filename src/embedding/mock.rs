use async_trait::async_trait;

use super::error::EmbeddingError;
use super::{Embedder, EmbeddingBatch};
use crate::ledger::TokenUsage;

/// Deterministic hash-derived embeddings for tests.
///
/// Identical texts embed identically; similar word sets land close enough
/// for overlap-style assertions. No network, no model files.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        // Each word bumps a few hash-selected dimensions, so shared words
        // produce overlapping components.
        for word in text.to_lowercase().split_whitespace() {
            let hash = crate::hashing::hash_to_u64(word.as_bytes());
            for i in 0..3 {
                let idx = (hash.rotate_left(i * 16) as usize) % self.dimension;
                vector[idx] += 1.0;
            }
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch, EmbeddingError> {
        Ok(EmbeddingBatch {
            vectors: texts.iter().map(|t| self.embed_one(t)).collect(),
            usage: TokenUsage {
                prompt_tokens: texts.iter().map(|t| t.split_whitespace().count() as u64).sum(),
                completion_tokens: 0,
            },
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embeddings_are_deterministic() {
        let embedder = MockEmbedder::default();
        let texts = vec!["road maintenance services".to_string()];

        let a = embedder.embed(&texts).await.unwrap();
        let b = embedder.embed(&texts).await.unwrap();

        assert_eq!(a.vectors, b.vectors);
        assert_eq!(a.vectors[0].len(), 64);
    }

    #[tokio::test]
    async fn test_mock_embeddings_are_normalized() {
        let embedder = MockEmbedder::default();
        let batch = embedder
            .embed(&["winter gritting across districts".to_string()])
            .await
            .unwrap();

        let norm: f32 = batch.vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_words_overlap_more_than_disjoint() {
        let embedder = MockEmbedder::default();
        let batch = embedder
            .embed(&[
                "road maintenance contract".to_string(),
                "road maintenance tender".to_string(),
                "catering kitchen equipment".to_string(),
            ])
            .await
            .unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };

        let similar = dot(&batch.vectors[0], &batch.vectors[1]);
        let dissimilar = dot(&batch.vectors[0], &batch.vectors[2]);

        assert!(similar > dissimilar);
    }
}
