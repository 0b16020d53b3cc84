use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extraction::ExtractionStatus;
use crate::scoring::{CriterionDefinition, CriterionResult};

/// A tender surfaced by search, not yet evaluated. Read-only for the
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTender {
    /// Source URL; the tender's identifier.
    pub url: String,
    /// Tender name as listed at the source.
    pub name: String,
    /// Issuing organization.
    pub organization: String,
    /// Source the tender was found on.
    #[serde(default)]
    pub source_type: String,
    /// Publication date, when the source provides one.
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    /// Submission deadline, when the source provides one.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Opaque search-match metadata from the search collaborator.
    #[serde(default)]
    pub search_match: Option<serde_json::Value>,
}

/// Pipeline stage a tender was rejected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterStage {
    /// Batched coarse relevance filter over raw candidates.
    InitialAiFilter,
    /// File/text extraction.
    FileExtraction,
    /// Batched description-based filter over assembled results.
    AiDescriptionFilter,
}

/// Archival record for a rejected tender. Write-once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredOutRecord {
    /// Stage the tender was rejected at.
    pub stage: FilterStage,
    /// Human-readable rejection reason.
    pub reason: String,
    /// Tender name.
    pub name: String,
    /// Issuing organization.
    pub organization: String,
    /// Source URL.
    pub url: String,
    /// Snapshot of whatever partial data existed at rejection time.
    pub snapshot: serde_json::Value,
    /// Archive timestamp.
    pub created_at: DateTime<Utc>,
}

impl FilteredOutRecord {
    /// Archives a candidate rejected before analysis was assembled.
    pub fn from_candidate(
        stage: FilterStage,
        reason: impl Into<String>,
        tender: &CandidateTender,
    ) -> Self {
        Self {
            stage,
            reason: reason.into(),
            name: tender.name.clone(),
            organization: tender.organization.clone(),
            url: tender.url.clone(),
            snapshot: serde_json::to_value(tender).unwrap_or_default(),
            created_at: Utc::now(),
        }
    }

    /// Archives an assembled result rejected by the description filter.
    pub fn from_result(reason: impl Into<String>, result: &TenderAnalysisResult) -> Self {
        Self {
            stage: FilterStage::AiDescriptionFilter,
            reason: reason.into(),
            name: result.name.clone(),
            organization: result.organization.clone(),
            url: result.url.clone(),
            snapshot: serde_json::to_value(result).unwrap_or_default(),
            created_at: Utc::now(),
        }
    }
}

/// One file uploaded during extraction, as referenced from results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Original filename.
    pub filename: String,
    /// Storage locator assigned by the extraction service.
    pub locator: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Embedding-namespace reference for this file's chunks.
    pub namespace: String,
}

/// Per-candidate outcome of the extraction stage. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Extraction status.
    pub status: ExtractionStatus,
    /// Uploaded-file records.
    pub files: Vec<UploadedFile>,
    /// Correlation key for all subsequent vector lookups for this tender.
    pub document_id: String,
}

/// The final artifact of one tender's analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenderAnalysisResult {
    /// Correlation key into the vector store.
    pub document_id: String,
    /// Source URL.
    pub url: String,
    /// Tender name.
    pub name: String,
    /// Issuing organization.
    pub organization: String,
    /// Relevance score in `[0.0, 1.0]`.
    pub score: f64,
    /// Ordered criterion results (definition order).
    pub criteria: Vec<CriterionResult>,
    /// Generated description (empty when generation failed softly).
    pub description: String,
    /// Delivery city, when stated.
    #[serde(default)]
    pub city: Option<String>,
    /// Delivery region, when stated.
    #[serde(default)]
    pub region: Option<String>,
    /// Uploaded files.
    pub files: Vec<UploadedFile>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// When a user first opened the result (set externally).
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}

impl TenderAnalysisResult {
    /// Names of unmet disqualifying criteria, for caller policy. The score
    /// formula itself is unaffected by disqualification.
    pub fn failed_disqualifying<'a>(
        &'a self,
        definitions: &'a [CriterionDefinition],
    ) -> Vec<&'a str> {
        definitions
            .iter()
            .filter(|d| d.is_disqualifying)
            .filter(|d| {
                self.criteria
                    .iter()
                    .find(|r| r.criteria == d.name)
                    .is_some_and(|r| !r.effective_met())
            })
            .map(|d| d.name.as_str())
            .collect()
    }
}

/// What the caller of a run receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Candidates returned by search.
    pub total_candidates: usize,
    /// Candidates that survived the initial AI filter.
    pub survived_initial_filter: usize,
    /// Tenders that survived the full per-item pipeline.
    pub survived_pipeline: usize,
    /// Results that survived the description filter.
    pub survived_description_filter: usize,
    /// Results persisted to the store.
    pub persisted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Confidence;

    fn tender() -> CandidateTender {
        CandidateTender {
            url: "https://tenders.example.gov/notice/1".to_string(),
            name: "Road resurfacing".to_string(),
            organization: "Example City Council".to_string(),
            source_type: "public-portal".to_string(),
            published: None,
            deadline: None,
            search_match: None,
        }
    }

    fn result_with(criteria: Vec<CriterionResult>) -> TenderAnalysisResult {
        let now = chrono::Utc::now();
        TenderAnalysisResult {
            document_id: "doc-1".to_string(),
            url: "https://tenders.example.gov/notice/1".to_string(),
            name: "Road resurfacing".to_string(),
            organization: "Example City Council".to_string(),
            score: 0.70,
            criteria,
            description: String::new(),
            city: None,
            region: None,
            files: vec![],
            created_at: now,
            updated_at: now,
            opened_at: None,
        }
    }

    #[test]
    fn test_filter_stage_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&FilterStage::InitialAiFilter).unwrap(),
            "\"INITIAL_AI_FILTER\""
        );
        assert_eq!(
            serde_json::to_string(&FilterStage::AiDescriptionFilter).unwrap(),
            "\"AI_DESCRIPTION_FILTER\""
        );
    }

    #[test]
    fn test_filtered_record_snapshots_candidate() {
        let record = FilteredOutRecord::from_candidate(
            FilterStage::InitialAiFilter,
            "not matched",
            &tender(),
        );

        assert_eq!(record.name, "Road resurfacing");
        assert_eq!(record.snapshot["url"], "https://tenders.example.gov/notice/1");
    }

    #[test]
    fn test_failed_disqualifying_lists_unmet_only() {
        let definitions = vec![
            CriterionDefinition::new("licence", "Has the required licence?").disqualifying(),
            CriterionDefinition::new("bond", "Can post a bid bond?").disqualifying(),
            CriterionDefinition::new("nice-to-have", "Offers e-invoicing?"),
        ];
        let result = result_with(vec![
            CriterionResult {
                criteria: "licence".to_string(),
                summary: String::new(),
                confidence: Confidence::High,
                criteria_met: Some(false),
            },
            CriterionResult {
                criteria: "bond".to_string(),
                summary: String::new(),
                confidence: Confidence::High,
                criteria_met: Some(true),
            },
            CriterionResult {
                criteria: "nice-to-have".to_string(),
                summary: String::new(),
                confidence: Confidence::Low,
                criteria_met: Some(false),
            },
        ]);

        assert_eq!(result.failed_disqualifying(&definitions), vec!["licence"]);
    }
}
