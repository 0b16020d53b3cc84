//! Tendersift library crate (used by the batch binary and integration
//! tests).
//!
//! # Public API Surface
//!
//! The exports are organized by module:
//!
//! ## Pipeline (Stable)
//! - [`AnalysisPipeline`], [`PipelineConfig`] - Batch orchestrator
//! - [`StageRunner`], [`RunnerConfig`] - Per-tender stage runner
//! - [`RunSummary`], [`TenderAnalysisResult`], [`FilteredOutRecord`] - Run
//!   artifacts
//!
//! ## Chunking & Scoring
//! - [`Chunker`], [`ChunkerConfig`], [`TokenCounter`] - Token-bounded
//!   chunking
//! - [`RelevanceScorer`], [`ScoringConfig`] - Confidence-weighted scoring
//! - [`CriterionDefinition`], [`CriterionResult`] - Criteria model
//!
//! ## Collaborators
//! - [`TenderSearch`], [`Extractor`], [`SemanticIndex`], [`LlmGateway`],
//!   [`AnalysisStore`], [`CostLedger`] - Async seams to external systems
//! - [`QdrantIndex`], [`HttpEmbedder`], [`GenaiGateway`], [`HttpExtractor`],
//!   [`HttpSearch`] - Production implementations
//! - [`InMemoryStore`], [`InMemoryLedger`] - Embedded implementations
//!
//! ## Test/Mock Support
//! Mock implementations are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod chunker;
pub mod config;
pub mod embedding;
pub mod extraction;
pub mod gateway;
pub mod hashing;
pub mod ledger;
pub mod pipeline;
pub mod retry;
pub mod scoring;
pub mod search;
pub mod storage;
pub mod vectordb;

pub use chunker::{Chunker, ChunkerConfig, ChunkerError, TokenCounter};
pub use config::{Config, ConfigError};
pub use embedding::{Embedder, EmbeddingError, HttpEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use extraction::{
    ExtractedDocument, ExtractedFile, ExtractionError, ExtractionStatus, Extractor, HttpExtractor,
};
#[cfg(any(test, feature = "mock"))]
pub use extraction::MockExtractor;
pub use gateway::{GatewayError, GenaiGateway, JsonRequest, JsonResponse, LlmGateway};
#[cfg(any(test, feature = "mock"))]
pub use gateway::MockLlmGateway;
pub use ledger::{
    CostLedger, CostLedgerEntry, EntryId, InMemoryLedger, LedgerError, TerminalStatus, TokenUsage,
    UsageStage,
};
pub use pipeline::{
    AnalysisPipeline, CandidateTender, ExtractionOutcome, FilterStage, FilteredOutRecord,
    PipelineConfig, PipelineError, RunSummary, RunnerConfig, StageOutcome, StageRunner,
    TenderAnalysisResult, UploadedFile,
};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use scoring::{
    Confidence, CriterionDefinition, CriterionResult, RelevanceScorer, ScoringConfig, ScoringError,
    align_result_names,
};
pub use search::{HttpSearch, SearchError, SearchQuery, TenderSearch};
#[cfg(any(test, feature = "mock"))]
pub use search::MockSearch;
pub use storage::{AnalysisConfig, AnalysisStore, InMemoryStore, StoreError};
pub use vectordb::{
    ChunkRecord, DEFAULT_SCORE_THRESHOLD, DEFAULT_TOP_K, IndexError, QdrantIndex, RetrievedChunk,
    SemanticIndex,
};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockSemanticIndex;
