//! Document-store collaborator: analysis configurations in, results and
//! archived rejects out.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::types::{FilteredOutRecord, TenderAnalysisResult};
use crate::scoring::CriterionDefinition;

/// One buyer's analysis configuration. Read-only for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Search phrase handed to the search collaborator.
    pub search_phrase: String,
    /// Buyer profile used by both AI filters.
    pub company_profile: String,
    /// Free-text rules applied by the description filter.
    #[serde(default)]
    pub filtering_rules: Option<String>,
    /// Output language for generated text.
    #[serde(default = "default_language")]
    pub language: String,
    /// Source identifiers to search.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Criteria evaluated against every tender.
    pub criteria: Vec<CriterionDefinition>,
    /// Last completed run, if any.
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

fn default_language() -> String {
    "English".to_string()
}

#[derive(Debug, Error)]
/// Errors returned by the document store.
pub enum StoreError {
    /// No analysis with the given id.
    #[error("analysis not found: {id}")]
    AnalysisNotFound {
        /// Requested id.
        id: String,
    },

    /// The backing store rejected the operation.
    #[error("store failure: {message}")]
    Backend {
        /// Failure detail.
        message: String,
    },
}

/// Async document-store interface used by the orchestrator.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Loads one analysis configuration.
    async fn load_analysis(&self, id: &str) -> Result<AnalysisConfig, StoreError>;

    /// Persists the surviving analysis results of one run.
    async fn persist_results(
        &self,
        analysis_id: &str,
        results: &[TenderAnalysisResult],
    ) -> Result<(), StoreError>;

    /// Archives one rejected tender. Write-once.
    async fn archive_filtered(
        &self,
        analysis_id: &str,
        record: FilteredOutRecord,
    ) -> Result<(), StoreError>;

    /// Records a completed run on the analysis (`last_run`).
    async fn mark_run_completed(
        &self,
        analysis_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
