//! Per-item pipeline stage runner.
//!
//! One invocation drives one candidate tender through a strictly linear
//! state machine: extraction, chunking/indexing, criteria evaluation,
//! description generation, assembly. Hard failures terminate the tender and
//! mark its ledger entry failed; a description failure is soft. The
//! boundary never lets an error escape into the orchestrator's fan-out.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::types::{
    CandidateTender, ExtractionOutcome, FilterStage, TenderAnalysisResult, UploadedFile,
};
use crate::chunker::Chunker;
use crate::extraction::{ExtractionStatus, Extractor};
use crate::gateway::{LlmGateway, parse_structured, prompts};
use crate::hashing;
use crate::ledger::{CostLedger, EntryId, TerminalStatus, UsageStage};
use crate::scoring::{CriterionResult, RelevanceScorer, align_result_names};
use crate::storage::AnalysisConfig;
use crate::vectordb::{ChunkRecord, RetrievedChunk, SemanticIndex};

/// Retrieval knobs for criteria evaluation and description context.
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    /// Chunks retrieved per query.
    pub top_k: u64,
    /// Similarity floor for retrieved chunks.
    pub score_threshold: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            top_k: crate::vectordb::DEFAULT_TOP_K,
            score_threshold: crate::vectordb::DEFAULT_SCORE_THRESHOLD,
        }
    }
}

/// Terminal outcome of one stage-runner invocation.
#[derive(Debug)]
pub enum StageOutcome {
    /// The tender was fully analyzed.
    Built(Box<TenderAnalysisResult>),
    /// The tender was dropped. `archive_stage` is set when the failure
    /// should be recoverable from the reject archive.
    Failed {
        /// Stage to archive the reject under, if any.
        archive_stage: Option<FilterStage>,
        /// Failure reason.
        reason: String,
    },
}

struct StageFailure {
    archive_stage: Option<FilterStage>,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct DescriptionResponse {
    description: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

/// Drives one candidate tender to a terminal state.
pub struct StageRunner {
    extractor: Arc<dyn Extractor>,
    index: Arc<dyn SemanticIndex>,
    gateway: Arc<dyn LlmGateway>,
    ledger: Arc<dyn CostLedger>,
    chunker: Chunker,
    scorer: RelevanceScorer,
    config: RunnerConfig,
}

impl StageRunner {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        index: Arc<dyn SemanticIndex>,
        gateway: Arc<dyn LlmGateway>,
        ledger: Arc<dyn CostLedger>,
        chunker: Chunker,
        scorer: RelevanceScorer,
        config: RunnerConfig,
    ) -> Self {
        Self {
            extractor,
            index,
            gateway,
            ledger,
            chunker,
            scorer,
            config,
        }
    }

    /// Analyzes one tender. Never returns an error: every failure is
    /// classified, logged with the tender URL, and reflected in the ledger
    /// entry's terminal state.
    pub async fn analyze(
        &self,
        tender: &CandidateTender,
        analysis: &AnalysisConfig,
        run_id: Uuid,
    ) -> StageOutcome {
        let entry = match self.ledger.create(&tender.url, &analysis.id, run_id).await {
            Ok(entry) => entry,
            Err(e) => {
                error!(tender = %tender.url, error = %e, "could not open ledger entry");
                return StageOutcome::Failed {
                    archive_stage: None,
                    reason: format!("ledger entry creation failed: {e}"),
                };
            }
        };

        match self.run_stages(tender, analysis, &entry).await {
            Ok(result) => {
                if let Err(e) = self.ledger.complete(&entry, TerminalStatus::Completed).await {
                    warn!(tender = %tender.url, error = %e, "could not complete ledger entry");
                }
                info!(
                    tender = %tender.url,
                    document_id = %result.document_id,
                    score = result.score,
                    "tender analysis completed"
                );
                StageOutcome::Built(Box::new(result))
            }
            Err(failure) => {
                if let Err(e) = self.ledger.complete(&entry, TerminalStatus::Failed).await {
                    warn!(tender = %tender.url, error = %e, "could not fail ledger entry");
                }
                warn!(
                    tender = %tender.url,
                    reason = %failure.reason,
                    "tender analysis failed, siblings unaffected"
                );
                StageOutcome::Failed {
                    archive_stage: failure.archive_stage,
                    reason: failure.reason,
                }
            }
        }
    }

    async fn run_stages(
        &self,
        tender: &CandidateTender,
        analysis: &AnalysisConfig,
        entry: &EntryId,
    ) -> Result<TenderAnalysisResult, StageFailure> {
        // Candidate -> Extracted
        let (extraction, seed_text) = self.extract(tender, analysis, entry).await?;

        // Extracted -> CriteriaAnalyzed
        let criteria_results = self
            .evaluate_criteria(tender, analysis, &extraction.document_id, entry)
            .await?;

        // CriteriaAnalyzed -> DescriptionAttempted (soft)
        let description = self
            .generate_description(tender, analysis, &extraction.document_id, &seed_text, entry)
            .await;

        // Evaluation is done with the vectors; drop them so the namespace
        // cannot leak into later runs.
        if let Err(e) = self.index.delete_document(&extraction.document_id).await {
            warn!(
                tender = %tender.url,
                document_id = %extraction.document_id,
                error = %e,
                "vector cleanup failed"
            );
        }

        // DescriptionAttempted -> Scored/Built
        let score = self
            .scorer
            .score(&criteria_results, &analysis.criteria)
            .map_err(|e| StageFailure {
                archive_stage: None,
                reason: format!("scoring failed: {e}"),
            })?;

        let now = chrono::Utc::now();
        Ok(TenderAnalysisResult {
            document_id: extraction.document_id,
            url: tender.url.clone(),
            name: tender.name.clone(),
            organization: tender.organization.clone(),
            score,
            criteria: criteria_results,
            description: description.description,
            city: description.city,
            region: description.region,
            files: extraction.files,
            created_at: now,
            updated_at: now,
            opened_at: None,
        })
    }

    async fn extract(
        &self,
        tender: &CandidateTender,
        analysis: &AnalysisConfig,
        entry: &EntryId,
    ) -> Result<(ExtractionOutcome, String), StageFailure> {
        let document = self.extractor.extract(tender).await.map_err(|e| StageFailure {
            archive_stage: Some(FilterStage::FileExtraction),
            reason: format!("extraction failed: {e}"),
        })?;

        if !document.is_usable() {
            let reason = match document.status {
                ExtractionStatus::Failed => "extraction reported failure".to_string(),
                ExtractionStatus::Skipped => "no extractable documents found".to_string(),
                ExtractionStatus::Success => "extraction produced no files".to_string(),
            };
            return Err(StageFailure {
                archive_stage: Some(FilterStage::FileExtraction),
                reason,
            });
        }

        let document_id = hashing::document_id(&tender.url);
        let mut files = Vec::with_capacity(document.files.len());
        let mut records = Vec::new();
        let mut next_chunk_index = 0usize;

        for (file_index, file) in document.files.iter().enumerate() {
            let chunks = self.chunker.chunk(&file.text).map_err(|e| StageFailure {
                archive_stage: Some(FilterStage::FileExtraction),
                reason: format!("chunking failed for '{}': {e}", file.filename),
            })?;

            for chunk in chunks {
                // Oversized atomic units are the chunker's escape hatch;
                // the embedding stage decides, and logs, that they are
                // skipped.
                match self.chunker.is_oversized(&chunk) {
                    Ok(true) => {
                        warn!(
                            tender = %tender.url,
                            file = %file.filename,
                            chunk_len = chunk.len(),
                            "skipping oversized chunk at embedding stage"
                        );
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        return Err(StageFailure {
                            archive_stage: Some(FilterStage::FileExtraction),
                            reason: format!("token counting failed: {e}"),
                        });
                    }
                }

                records.push(ChunkRecord {
                    chunk_index: next_chunk_index,
                    text: chunk,
                    source_file: file.filename.clone(),
                });
                next_chunk_index += 1;
            }

            files.push(UploadedFile {
                filename: file.filename.clone(),
                locator: file.locator.clone(),
                size_bytes: file.size_bytes,
                namespace: format!("{document_id}/{file_index}"),
            });
        }

        let usage = self
            .index
            .index_chunks(&analysis.id, &document_id, records)
            .await
            .map_err(|e| StageFailure {
                archive_stage: Some(FilterStage::FileExtraction),
                reason: format!("indexing failed: {e}"),
            })?;
        if let Err(e) = self.ledger.record_usage(entry, UsageStage::Embedding, usage).await {
            warn!(tender = %tender.url, error = %e, "could not record embedding usage");
        }

        debug!(
            tender = %tender.url,
            document_id = %document_id,
            files = files.len(),
            chunks = next_chunk_index,
            "extraction outcome built"
        );

        let seed_text = if document.seed_text.trim().is_empty() {
            format!("{} — {}", tender.name, tender.organization)
        } else {
            document.seed_text.clone()
        };

        Ok((
            ExtractionOutcome {
                status: document.status,
                files,
                document_id,
            },
            seed_text,
        ))
    }

    async fn evaluate_criteria(
        &self,
        tender: &CandidateTender,
        analysis: &AnalysisConfig,
        document_id: &str,
        entry: &EntryId,
    ) -> Result<Vec<CriterionResult>, StageFailure> {
        let mut results = Vec::with_capacity(analysis.criteria.len());

        for criterion in &analysis.criteria {
            let context = self
                .retrieve_context(document_id, criterion.retrieval_queries())
                .await
                .map_err(|e| StageFailure {
                    archive_stage: None,
                    reason: format!("retrieval failed for criterion '{}': {e}", criterion.name),
                })?;

            let request = prompts::criterion_evaluation(criterion, &context, &analysis.language);
            let response = self.gateway.complete_json(request).await.map_err(|e| {
                StageFailure {
                    archive_stage: None,
                    reason: format!("criteria evaluation failed for '{}': {e}", criterion.name),
                }
            })?;
            if let Err(e) = self
                .ledger
                .record_usage(entry, UsageStage::CriteriaAnalysis, response.usage)
                .await
            {
                warn!(tender = %tender.url, error = %e, "could not record criteria usage");
            }

            let result: CriterionResult =
                parse_structured(response.value).map_err(|e| StageFailure {
                    archive_stage: None,
                    reason: format!("criteria response invalid for '{}': {e}", criterion.name),
                })?;
            results.push(result);
        }

        align_result_names(&mut results, &analysis.criteria);
        Ok(results)
    }

    /// Description generation is a soft stage: any failure degrades to an
    /// empty description instead of discarding the analysis.
    async fn generate_description(
        &self,
        tender: &CandidateTender,
        analysis: &AnalysisConfig,
        document_id: &str,
        seed_text: &str,
        entry: &EntryId,
    ) -> DescriptionResponse {
        let context = match self
            .retrieve_context(
                document_id,
                vec!["subject scope of the contract and contracting authority".to_string()],
            )
            .await
        {
            Ok(context) => context,
            Err(e) => {
                warn!(tender = %tender.url, error = %e, "description context retrieval failed");
                Vec::new()
            }
        };

        let request = prompts::description(seed_text, &context, &analysis.language);

        match self.gateway.complete_json(request).await {
            Ok(response) => {
                if let Err(e) = self
                    .ledger
                    .record_usage(entry, UsageStage::Description, response.usage)
                    .await
                {
                    warn!(tender = %tender.url, error = %e, "could not record description usage");
                }
                match parse_structured::<DescriptionResponse>(response.value) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(
                            tender = %tender.url,
                            error = %e,
                            "description response invalid, defaulting to empty"
                        );
                        DescriptionResponse::empty()
                    }
                }
            }
            Err(e) => {
                warn!(
                    tender = %tender.url,
                    error = %e,
                    "description generation failed, defaulting to empty"
                );
                DescriptionResponse::empty()
            }
        }
    }

    async fn retrieve_context(
        &self,
        document_id: &str,
        queries: Vec<String>,
    ) -> Result<Vec<RetrievedChunk>, crate::vectordb::IndexError> {
        let mut context: Vec<RetrievedChunk> = Vec::new();

        for query in queries {
            let retrieved = self
                .index
                .query(
                    document_id,
                    &query,
                    self.config.top_k,
                    self.config.score_threshold,
                )
                .await?;

            for chunk in retrieved {
                let duplicate = context
                    .iter()
                    .any(|c| c.chunk_index == chunk.chunk_index && c.source_file == chunk.source_file);
                if !duplicate {
                    context.push(chunk);
                }
            }
        }

        context.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        context.truncate(self.config.top_k as usize);
        Ok(context)
    }
}

impl DescriptionResponse {
    fn empty() -> Self {
        Self {
            description: String::new(),
            city: None,
            region: None,
        }
    }
}
