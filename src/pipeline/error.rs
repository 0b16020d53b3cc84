use thiserror::Error;

use crate::gateway::GatewayError;
use crate::ledger::LedgerError;
use crate::scoring::ScoringError;
use crate::search::SearchError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
/// Run-level pipeline errors. Anything surfacing here marks the whole
/// run's ledger entry failed; per-tender failures never become one of
/// these.
pub enum PipelineError {
    /// The analysis configuration cannot produce a score. Aborts the run
    /// before any tender is processed.
    #[error("analysis configuration invalid: {0}")]
    Configuration(#[from] ScoringError),

    /// Document-store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Search collaborator failure.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// A batched filter call failed beyond recovery.
    #[error("batched filter failed: {0}")]
    Filter(#[from] GatewayError),

    /// Cost-ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
