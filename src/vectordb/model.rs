use qdrant_client::qdrant::ScoredPoint;

/// One chunk of one document, ready for indexing.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// Position of the chunk within its document.
    pub chunk_index: usize,
    /// Chunk text.
    pub text: String,
    /// Filename the chunk came from.
    pub source_file: String,
}

/// One chunk retrieved by a scoped similarity query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// Chunk text.
    pub text: String,
    /// Similarity score.
    pub score: f32,
    /// Filename the chunk came from.
    pub source_file: String,
    /// Position of the chunk within its document.
    pub chunk_index: usize,
}

impl RetrievedChunk {
    /// Builds a retrieved chunk from a Qdrant scored point, skipping points
    /// with unusable payloads.
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let payload = point.payload;

        let text = payload.get("text").and_then(|v| v.as_str())?.to_string();
        let source_file = payload
            .get("source_file")
            .and_then(|v| v.as_str())
            .map(String::as_str)
            .unwrap_or_default()
            .to_string();
        let chunk_index = payload
            .get("chunk_index")
            .and_then(|v| v.as_integer())
            .unwrap_or(0) as usize;

        Some(Self {
            text,
            score: point.score,
            source_file,
            chunk_index,
        })
    }
}
