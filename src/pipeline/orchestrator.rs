//! Batch orchestrator: one full analysis run for one configuration.
//!
//! Search, initial AI filter, bounded fan-out over the stage runner,
//! description filter, persistence. Per-tender failures stay inside the
//! fan-out; anything that escapes this sequence fails the whole run's
//! ledger entry and surfaces to the caller.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::PipelineError;
use super::filters;
use super::runner::{StageOutcome, StageRunner};
use super::types::{FilteredOutRecord, RunSummary, TenderAnalysisResult};
use crate::extraction::Extractor;
use crate::gateway::LlmGateway;
use crate::ledger::{CostLedger, EntryId, TerminalStatus};
use crate::scoring::RelevanceScorer;
use crate::search::{SearchQuery, TenderSearch};
use crate::storage::{AnalysisConfig, AnalysisStore};

/// Ledger subject used for the run-level entry.
const RUN_SUBJECT: &str = "analysis-run";

/// Orchestrator knobs.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Concurrent stage-runner ceiling (hard, semaphore-enforced).
    pub worker_limit: usize,
    /// Candidates per batched AI-filter request.
    pub filter_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_limit: 8,
            filter_batch_size: 20,
        }
    }
}

/// Drives complete analysis runs.
pub struct AnalysisPipeline {
    store: Arc<dyn AnalysisStore>,
    search: Arc<dyn TenderSearch>,
    gateway: Arc<dyn LlmGateway>,
    ledger: Arc<dyn CostLedger>,
    extractor: Arc<dyn Extractor>,
    runner: Arc<StageRunner>,
    scorer: RelevanceScorer,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        search: Arc<dyn TenderSearch>,
        gateway: Arc<dyn LlmGateway>,
        ledger: Arc<dyn CostLedger>,
        extractor: Arc<dyn Extractor>,
        runner: Arc<StageRunner>,
        scorer: RelevanceScorer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            search,
            gateway,
            ledger,
            extractor,
            runner,
            scorer,
            config,
        }
    }

    /// Runs one full analysis. The run-level ledger entry is finalized and
    /// the extraction service released on every exit path.
    pub async fn run(&self, analysis_id: &str) -> Result<RunSummary, PipelineError> {
        let run_id = Uuid::new_v4();
        info!(analysis_id, %run_id, "starting analysis run");

        let run_entry = self.ledger.create(RUN_SUBJECT, analysis_id, run_id).await?;

        let outcome = self.execute(analysis_id, run_id, &run_entry).await;

        let status = match &outcome {
            Ok(_) => TerminalStatus::Completed,
            Err(_) => TerminalStatus::Failed,
        };
        if let Err(e) = self.ledger.complete(&run_entry, status).await {
            warn!(%run_id, error = %e, "could not finalize run ledger entry");
        }
        if let Err(e) = self.extractor.shutdown().await {
            warn!(%run_id, error = %e, "extraction service shutdown failed");
        }

        match &outcome {
            Ok(summary) => info!(
                %run_id,
                total = summary.total_candidates,
                survived_initial_filter = summary.survived_initial_filter,
                survived_pipeline = summary.survived_pipeline,
                survived_description_filter = summary.survived_description_filter,
                persisted = summary.persisted,
                "analysis run completed"
            ),
            Err(e) => error!(%run_id, error = %e, "analysis run failed"),
        }

        outcome
    }

    async fn execute(
        &self,
        analysis_id: &str,
        run_id: Uuid,
        run_entry: &EntryId,
    ) -> Result<RunSummary, PipelineError> {
        let analysis = self.store.load_analysis(analysis_id).await?;

        // Fail fast on unscorable criteria before touching any tender.
        self.scorer.validate_definitions(&analysis.criteria)?;

        let query = SearchQuery {
            phrase: analysis.search_phrase.clone(),
            sources: analysis.sources.clone(),
            published_after: analysis.last_run,
        };
        let candidates = self.search.search(&query).await?;

        let mut summary = RunSummary {
            total_candidates: candidates.len(),
            ..Default::default()
        };

        if candidates.is_empty() {
            info!(analysis_id, "search returned no candidates, completing empty run");
            self.store.mark_run_completed(analysis_id, Utc::now()).await?;
            return Ok(summary);
        }

        let (survivors, rejects) = filters::run_initial_filter(
            self.gateway.as_ref(),
            self.ledger.as_ref(),
            run_entry,
            &analysis,
            candidates,
            self.config.filter_batch_size,
        )
        .await?;
        summary.survived_initial_filter = survivors.len();
        self.archive_all(analysis_id, rejects).await?;

        let results = self.fan_out(&analysis, survivors, run_id).await?;
        summary.survived_pipeline = results.len();

        if results.is_empty() {
            info!(analysis_id, "no tender survived the pipeline, completing empty run");
            self.store.mark_run_completed(analysis_id, Utc::now()).await?;
            return Ok(summary);
        }

        let (kept, rejects) = filters::run_description_filter(
            self.gateway.as_ref(),
            self.ledger.as_ref(),
            run_entry,
            &analysis,
            results,
            self.config.filter_batch_size,
        )
        .await?;
        summary.survived_description_filter = kept.len();
        self.archive_all(analysis_id, rejects).await?;

        self.store.persist_results(analysis_id, &kept).await?;
        summary.persisted = kept.len();

        self.store.mark_run_completed(analysis_id, Utc::now()).await?;
        Ok(summary)
    }

    /// Fans candidates out across the stage runner under the worker
    /// ceiling. Per-tender failures are archived or dropped here; nothing
    /// a single tender does can fail the batch.
    async fn fan_out(
        &self,
        analysis: &AnalysisConfig,
        survivors: Vec<super::types::CandidateTender>,
        run_id: Uuid,
    ) -> Result<Vec<TenderAnalysisResult>, PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.worker_limit.max(1)));
        let analysis = Arc::new(analysis.clone());

        let mut tasks = Vec::with_capacity(survivors.len());
        for tender in survivors {
            let runner = Arc::clone(&self.runner);
            let analysis = Arc::clone(&analysis);
            let semaphore = Arc::clone(&semaphore);

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = runner.analyze(&tender, &analysis, run_id).await;
                (tender, outcome)
            }));
        }

        let mut results = Vec::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok((_, StageOutcome::Built(result))) => results.push(*result),
                Ok((tender, StageOutcome::Failed { archive_stage, reason })) => {
                    if let Some(stage) = archive_stage {
                        self.store
                            .archive_filtered(
                                &analysis.id,
                                FilteredOutRecord::from_candidate(stage, reason, &tender),
                            )
                            .await?;
                    }
                }
                Err(join_error) => {
                    // A panicked worker loses its tender, nothing else.
                    error!(error = %join_error, "stage runner task aborted");
                }
            }
        }

        Ok(results)
    }

    async fn archive_all(
        &self,
        analysis_id: &str,
        records: Vec<FilteredOutRecord>,
    ) -> Result<(), PipelineError> {
        for record in records {
            self.store.archive_filtered(analysis_id, record).await?;
        }
        Ok(())
    }
}
