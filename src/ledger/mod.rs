//! Per-tender cost/usage accounting.
//!
//! Every tender processed in a run owns exactly one ledger entry; the run
//! itself owns one more. An entry accumulates token usage across stages and
//! reaches exactly one terminal state, [`TerminalStatus::Completed`] or
//! [`TerminalStatus::Failed`]. Entries are single-writer by construction:
//! each stage-runner invocation holds its own entry id and nothing else
//! writes to it.

pub mod memory;

pub use memory::InMemoryLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token usage reported by one inference or embedding call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt-side tokens.
    pub prompt_tokens: u64,
    /// Completion-side tokens.
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Sums two usage records.
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }

    /// Total tokens across both sides.
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Pipeline stage a usage record is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageStage {
    /// Batched coarse relevance filter.
    InitialFilter,
    /// Chunk embedding during indexing.
    Embedding,
    /// Per-criterion evaluation.
    CriteriaAnalysis,
    /// Description generation.
    Description,
    /// Batched description filter.
    DescriptionFilter,
}

/// Terminal state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalStatus {
    /// The tender (or run) finished successfully.
    Completed,
    /// The tender (or run) failed.
    Failed,
}

/// Opaque identifier of one ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One per-subject accounting record within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostLedgerEntry {
    /// Entry id.
    pub id: EntryId,
    /// Tender URL, or a run-scoped marker for the run-level entry.
    pub subject: String,
    /// Owning analysis configuration.
    pub analysis_id: String,
    /// Run this entry belongs to.
    pub run_id: Uuid,
    /// Accumulated usage per stage.
    pub usage: Vec<(UsageStage, TokenUsage)>,
    /// Terminal state, set exactly once.
    pub status: Option<TerminalStatus>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the terminal transition.
    pub finished_at: Option<DateTime<Utc>>,
}

impl CostLedgerEntry {
    /// Total usage across all stages.
    pub fn total_usage(&self) -> TokenUsage {
        let mut total = TokenUsage::default();
        for (_, usage) in &self.usage {
            total.add(*usage);
        }
        total
    }
}

#[derive(Debug, Error)]
/// Errors returned by the cost ledger.
pub enum LedgerError {
    /// The referenced entry does not exist.
    #[error("unknown ledger entry: {id}")]
    UnknownEntry {
        /// Entry id.
        id: EntryId,
    },

    /// The backing sink rejected the operation.
    #[error("ledger sink failure: {message}")]
    SinkFailure {
        /// Failure detail.
        message: String,
    },
}

/// Cost-ledger sink consumed by the pipeline.
#[async_trait]
pub trait CostLedger: Send + Sync {
    /// Opens one entry for `subject` within `run_id`.
    async fn create(
        &self,
        subject: &str,
        analysis_id: &str,
        run_id: Uuid,
    ) -> Result<EntryId, LedgerError>;

    /// Attributes `usage` to `stage` on an open entry. Usage recorded after
    /// the terminal transition is still accepted: late responses from
    /// in-flight calls must not be lost.
    async fn record_usage(
        &self,
        entry: &EntryId,
        stage: UsageStage,
        usage: TokenUsage,
    ) -> Result<(), LedgerError>;

    /// Sets the terminal state. The first terminal state wins; a second
    /// attempt is logged and ignored.
    async fn complete(&self, entry: &EntryId, status: TerminalStatus) -> Result<(), LedgerError>;
}
