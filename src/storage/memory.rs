use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{AnalysisConfig, AnalysisStore, StoreError};
use crate::pipeline::types::{FilteredOutRecord, TenderAnalysisResult};

/// In-memory store for embedded deployments and tests.
#[derive(Default)]
pub struct InMemoryStore {
    analyses: RwLock<HashMap<String, AnalysisConfig>>,
    results: RwLock<HashMap<String, Vec<TenderAnalysisResult>>>,
    filtered: RwLock<HashMap<String, Vec<FilteredOutRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one analysis configuration.
    pub fn with_analysis(self, analysis: AnalysisConfig) -> Self {
        self.analyses.write().insert(analysis.id.clone(), analysis);
        self
    }

    /// Persisted results for one analysis.
    pub fn results(&self, analysis_id: &str) -> Vec<TenderAnalysisResult> {
        self.results
            .read()
            .get(analysis_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Archived reject records for one analysis.
    pub fn filtered(&self, analysis_id: &str) -> Vec<FilteredOutRecord> {
        self.filtered
            .read()
            .get(analysis_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The stored `last_run` timestamp for one analysis.
    pub fn last_run(&self, analysis_id: &str) -> Option<DateTime<Utc>> {
        self.analyses
            .read()
            .get(analysis_id)
            .and_then(|a| a.last_run)
    }
}

#[async_trait]
impl AnalysisStore for InMemoryStore {
    async fn load_analysis(&self, id: &str) -> Result<AnalysisConfig, StoreError> {
        self.analyses
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::AnalysisNotFound { id: id.to_string() })
    }

    async fn persist_results(
        &self,
        analysis_id: &str,
        results: &[TenderAnalysisResult],
    ) -> Result<(), StoreError> {
        self.results
            .write()
            .entry(analysis_id.to_string())
            .or_default()
            .extend_from_slice(results);
        Ok(())
    }

    async fn archive_filtered(
        &self,
        analysis_id: &str,
        record: FilteredOutRecord,
    ) -> Result<(), StoreError> {
        self.filtered
            .write()
            .entry(analysis_id.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn mark_run_completed(
        &self,
        analysis_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut analyses = self.analyses.write();
        let analysis = analyses
            .get_mut(analysis_id)
            .ok_or_else(|| StoreError::AnalysisNotFound {
                id: analysis_id.to_string(),
            })?;

        analysis.last_run = Some(at);
        Ok(())
    }
}
