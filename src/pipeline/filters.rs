//! The two batched AI-filter gates.
//!
//! Both gates send many items in one request and correlate verdicts back by
//! an `id` round-tripped through the model. The initial gate additionally
//! recovers id-less verdicts by name/organization lookup, because
//! generative output drops fields often enough to matter.

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::types::{CandidateTender, FilterStage, FilteredOutRecord, TenderAnalysisResult};
use crate::gateway::{LlmGateway, parse_structured, prompts};
use crate::ledger::{CostLedger, EntryId, UsageStage};
use crate::storage::AnalysisConfig;

#[derive(Debug, Deserialize)]
struct InitialMatches {
    relevant: Vec<InitialMatch>,
}

#[derive(Debug, Deserialize)]
struct InitialMatch {
    #[serde(default)]
    id: Option<usize>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    organization: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescriptionVerdicts {
    verdicts: Vec<DescriptionVerdict>,
}

#[derive(Debug, Deserialize)]
struct DescriptionVerdict {
    #[serde(default)]
    id: Option<usize>,
    keep: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Runs the batched initial relevance filter over raw candidates.
///
/// Only candidates the model returned as matches survive; everything else
/// is archived under `INITIAL_AI_FILTER`. Matches lacking the round-tripped
/// id are recovered by name/organization lookup.
pub async fn run_initial_filter(
    gateway: &dyn LlmGateway,
    ledger: &dyn CostLedger,
    run_entry: &EntryId,
    analysis: &AnalysisConfig,
    candidates: Vec<CandidateTender>,
    batch_size: usize,
) -> Result<(Vec<CandidateTender>, Vec<FilteredOutRecord>), PipelineError> {
    let batch_size = batch_size.max(1);
    let mut matched = vec![false; candidates.len()];

    for (batch_index, batch) in candidates.chunks(batch_size).enumerate() {
        let offset = batch_index * batch_size;
        let listing: Vec<(usize, &str, &str)> = batch
            .iter()
            .enumerate()
            .map(|(i, c)| (offset + i, c.name.as_str(), c.organization.as_str()))
            .collect();

        let request = prompts::initial_filter(
            &analysis.company_profile,
            &analysis.search_phrase,
            &listing,
        );
        let response = gateway.complete_json(request).await?;
        ledger
            .record_usage(run_entry, UsageStage::InitialFilter, response.usage)
            .await?;

        let parsed: InitialMatches = parse_structured(response.value)?;

        for entry in parsed.relevant {
            if let Some(index) = resolve_match(&entry, batch, offset) {
                matched[index] = true;
            }
        }
    }

    let mut survivors = Vec::new();
    let mut records = Vec::new();
    for (index, candidate) in candidates.into_iter().enumerate() {
        if matched[index] {
            survivors.push(candidate);
        } else {
            debug!(tender = %candidate.url, "rejected by initial filter");
            records.push(FilteredOutRecord::from_candidate(
                FilterStage::InitialAiFilter,
                "not matched by initial relevance filter",
                &candidate,
            ));
        }
    }

    info!(
        survivors = survivors.len(),
        rejected = records.len(),
        "initial AI filter finished"
    );
    Ok((survivors, records))
}

/// Maps one returned match back to its candidate: by round-tripped id when
/// present and in range, otherwise by name/organization lookup.
fn resolve_match(entry: &InitialMatch, batch: &[CandidateTender], offset: usize) -> Option<usize> {
    if let Some(id) = entry.id {
        if id >= offset && id < offset + batch.len() {
            return Some(id);
        }
        warn!(id, "filter match id out of batch range, trying name recovery");
    }

    let name = entry.name.as_deref().unwrap_or_default();
    let organization = entry.organization.as_deref().unwrap_or_default();
    let recovered = batch.iter().position(|c| {
        (!name.is_empty() && c.name.eq_ignore_ascii_case(name))
            || (!organization.is_empty() && c.organization.eq_ignore_ascii_case(organization))
    });

    match recovered {
        Some(position) => {
            warn!(
                name,
                organization, "filter match missing id, recovered by name/organization"
            );
            Some(offset + position)
        }
        None => {
            warn!(
                name,
                organization,
                "filter match could not be correlated to any candidate, ignoring it"
            );
            None
        }
    }
}

/// Runs the batched description filter over assembled results.
///
/// Rejects come back as archive records (stage `AI_DESCRIPTION_FILTER`);
/// results without a verdict are kept.
pub async fn run_description_filter(
    gateway: &dyn LlmGateway,
    ledger: &dyn CostLedger,
    run_entry: &EntryId,
    analysis: &AnalysisConfig,
    results: Vec<TenderAnalysisResult>,
    batch_size: usize,
) -> Result<(Vec<TenderAnalysisResult>, Vec<FilteredOutRecord>), PipelineError> {
    let batch_size = batch_size.max(1);
    let mut rejected: Vec<(usize, String)> = Vec::new();

    for (batch_index, batch) in results.chunks(batch_size).enumerate() {
        let offset = batch_index * batch_size;
        let listing: Vec<(usize, &str)> = batch
            .iter()
            .enumerate()
            .map(|(i, r)| (offset + i, r.description.as_str()))
            .collect();

        let request = prompts::description_filter(
            &analysis.company_profile,
            analysis.filtering_rules.as_deref(),
            &listing,
        );
        let response = gateway.complete_json(request).await?;
        ledger
            .record_usage(run_entry, UsageStage::DescriptionFilter, response.usage)
            .await?;

        let parsed: DescriptionVerdicts = parse_structured(response.value)?;

        for verdict in parsed.verdicts {
            let Some(id) = verdict.id else {
                warn!("description filter verdict missing id, dropping verdict");
                continue;
            };
            if id < offset || id >= offset + batch.len() {
                warn!(id, "description filter verdict id out of range, dropping verdict");
                continue;
            }

            if !verdict.keep {
                rejected.push((
                    id,
                    verdict
                        .reason
                        .unwrap_or_else(|| "rejected by description filter".to_string()),
                ));
            }
        }
    }

    let mut kept = Vec::new();
    let mut records = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match rejected.iter().find(|(i, _)| *i == index) {
            Some((_, reason)) => {
                debug!(tender = %result.url, reason = %reason, "rejected by description filter");
                records.push(FilteredOutRecord::from_result(reason.clone(), &result));
            }
            None => kept.push(result),
        }
    }

    info!(
        kept = kept.len(),
        rejected = records.len(),
        "description filter finished"
    );
    Ok((kept, records))
}
