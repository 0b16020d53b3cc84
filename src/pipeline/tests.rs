use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::filters;
use super::runner::{RunnerConfig, StageOutcome, StageRunner};
use super::types::{CandidateTender, FilterStage, TenderAnalysisResult};
use crate::chunker::{Chunker, ChunkerConfig, TokenCounter};
use crate::extraction::{Extractor, MockExtractor};
use crate::gateway::{GatewayError, LlmGateway, MockLlmGateway};
use crate::ledger::{CostLedger, InMemoryLedger, TerminalStatus};
use crate::scoring::{CriterionDefinition, RelevanceScorer};
use crate::storage::AnalysisConfig;
use crate::vectordb::{MockSemanticIndex, SemanticIndex};

fn candidate(i: usize) -> CandidateTender {
    CandidateTender {
        url: format!("https://tenders.example.gov/notice/{i}"),
        name: format!("Tender {i}"),
        organization: format!("City {i}"),
        source_type: "public-portal".to_string(),
        published: None,
        deadline: None,
        search_match: None,
    }
}

fn analysis(criteria: Vec<CriterionDefinition>) -> AnalysisConfig {
    AnalysisConfig {
        id: "analysis-1".to_string(),
        name: "Road works".to_string(),
        search_phrase: "road maintenance".to_string(),
        company_profile: "Mid-size road construction company".to_string(),
        filtering_rules: None,
        language: "English".to_string(),
        sources: vec![],
        criteria,
        last_run: None,
    }
}

fn test_chunker() -> Chunker {
    Chunker::new(
        TokenCounter::whitespace(),
        ChunkerConfig {
            max_tokens: 64,
            canonical_score_threshold: 8,
        },
    )
}

fn test_runner_config() -> RunnerConfig {
    RunnerConfig {
        top_k: 5,
        score_threshold: 0.0,
    }
}

/// Parses the round-tripped ids out of a filter prompt listing.
fn listed_ids(user: &str) -> Vec<usize> {
    user.lines()
        .filter_map(|line| line.split_once('.').and_then(|(n, _)| n.trim().parse().ok()))
        .collect()
}

fn evaluation_gateway() -> MockLlmGateway {
    MockLlmGateway::new(|request| match request.operation {
        "criterion_evaluation" => Ok(json!({
            "criteria": "a paraphrased criterion name",
            "summary": "the documents confirm the requirement",
            "confidence": "HIGH",
            "criteria_met": true
        })),
        "description" => Ok(json!({
            "description": "Road maintenance tender for a mid-size municipality.",
            "city": "Exampleton",
            "region": null
        })),
        other => panic!("unexpected operation {other}"),
    })
}

fn build_runner(
    extractor: Arc<dyn Extractor>,
    index: Arc<dyn SemanticIndex>,
    gateway: Arc<dyn LlmGateway>,
    ledger: Arc<InMemoryLedger>,
) -> StageRunner {
    StageRunner::new(
        extractor,
        index,
        gateway,
        ledger,
        test_chunker(),
        RelevanceScorer::default(),
        test_runner_config(),
    )
}

mod runner {
    use super::*;

    #[tokio::test]
    async fn test_success_builds_scored_result() {
        let tender = candidate(0);
        let analysis = analysis(vec![
            CriterionDefinition::new("certifications", "Is ISO 9001 required?").with_weight(5),
        ]);
        let index = Arc::new(MockSemanticIndex::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let runner = build_runner(
            Arc::new(MockExtractor::new()),
            index.clone(),
            Arc::new(evaluation_gateway()),
            ledger.clone(),
        );

        let run_id = Uuid::new_v4();
        let outcome = runner.analyze(&tender, &analysis, run_id).await;

        let StageOutcome::Built(result) = outcome else {
            panic!("expected a built result");
        };
        assert_eq!(result.score, 1.00);
        assert_eq!(result.url, tender.url);
        // Paraphrased evaluator name realigned to the canonical one.
        assert_eq!(result.criteria[0].criteria, "certifications");
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.description, "Road maintenance tender for a mid-size municipality.");
        assert_eq!(result.city.as_deref(), Some("Exampleton"));

        let entries = ledger.entries_for_run(run_id);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, Some(TerminalStatus::Completed));
        assert!(entries[0].total_usage().total() > 0);

        // Vectors cleaned up after evaluation.
        assert!(!index.contains_document(&result.document_id));
    }

    #[tokio::test]
    async fn test_extraction_failure_is_terminal_and_archivable() {
        let tender = candidate(1);
        let config = analysis(vec![CriterionDefinition::new("c", "d").with_weight(1)]);
        let ledger = Arc::new(InMemoryLedger::new());
        let runner = build_runner(
            Arc::new(MockExtractor::new().failing_for(&tender.url)),
            Arc::new(MockSemanticIndex::new()),
            Arc::new(evaluation_gateway()),
            ledger.clone(),
        );

        let run_id = Uuid::new_v4();
        let outcome = runner.analyze(&tender, &config, run_id).await;

        let StageOutcome::Failed { archive_stage, reason } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(archive_stage, Some(FilterStage::FileExtraction));
        assert!(reason.contains("extraction"));
        assert_eq!(ledger.count_with_status(run_id, TerminalStatus::Failed), 1);
    }

    #[tokio::test]
    async fn test_criteria_schema_violation_is_stage_failure() {
        let tender = candidate(2);
        let config = analysis(vec![CriterionDefinition::new("c", "d").with_weight(1)]);
        let gateway = MockLlmGateway::new(|request| match request.operation {
            // Wrong shape: confidence missing, criteria not a string.
            "criterion_evaluation" => Ok(json!({ "criteria": 17 })),
            _ => Ok(json!({ "description": "", "city": null, "region": null })),
        });
        let ledger = Arc::new(InMemoryLedger::new());
        let runner = build_runner(
            Arc::new(MockExtractor::new()),
            Arc::new(MockSemanticIndex::new()),
            Arc::new(gateway),
            ledger.clone(),
        );

        let run_id = Uuid::new_v4();
        let outcome = runner.analyze(&tender, &config, run_id).await;

        let StageOutcome::Failed { archive_stage, reason } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(archive_stage, None);
        assert!(reason.contains("criteria"));
        assert_eq!(ledger.count_with_status(run_id, TerminalStatus::Failed), 1);
    }

    #[tokio::test]
    async fn test_description_failure_is_soft() {
        let tender = candidate(3);
        let config = analysis(vec![CriterionDefinition::new("c", "d").with_weight(1)]);
        let gateway = MockLlmGateway::new(|request| match request.operation {
            "criterion_evaluation" => Ok(json!({
                "criteria": "c",
                "summary": "ok",
                "confidence": "MEDIUM",
                "criteria_met": false
            })),
            "description" => Err(GatewayError::Provider {
                operation: "description".to_string(),
                message: "upstream 500".to_string(),
            }),
            other => panic!("unexpected operation {other}"),
        });
        let ledger = Arc::new(InMemoryLedger::new());
        let runner = build_runner(
            Arc::new(MockExtractor::new()),
            Arc::new(MockSemanticIndex::new()),
            Arc::new(gateway),
            ledger.clone(),
        );

        let run_id = Uuid::new_v4();
        let outcome = runner.analyze(&tender, &config, run_id).await;

        // A missing description must not discard an otherwise-valid
        // analysis.
        let StageOutcome::Built(result) = outcome else {
            panic!("expected a built result despite description failure");
        };
        assert_eq!(result.description, "");
        assert_eq!(result.score, 0.40);
        assert_eq!(ledger.count_with_status(run_id, TerminalStatus::Completed), 1);
    }
}

mod initial_filter {
    use super::*;

    async fn run_filter(
        gateway: &MockLlmGateway,
        candidates: Vec<CandidateTender>,
        batch_size: usize,
    ) -> Result<
        (Vec<CandidateTender>, Vec<super::super::types::FilteredOutRecord>),
        super::super::PipelineError,
    > {
        let ledger = InMemoryLedger::new();
        let run_entry = ledger
            .create("analysis-run", "analysis-1", Uuid::new_v4())
            .await
            .unwrap();
        filters::run_initial_filter(
            gateway,
            &ledger,
            &run_entry,
            &analysis(vec![]),
            candidates,
            batch_size,
        )
        .await
    }

    #[tokio::test]
    async fn test_keeps_only_returned_matches() {
        let gateway = MockLlmGateway::new(|request| {
            let ids = listed_ids(&request.user);
            // Keep every candidate except id 1.
            let relevant: Vec<_> = ids
                .into_iter()
                .filter(|&id| id != 1)
                .map(|id| json!({ "id": id }))
                .collect();
            Ok(json!({ "relevant": relevant }))
        });

        let (survivors, records) = run_filter(&gateway, (0..3).map(candidate).collect(), 20)
            .await
            .unwrap();

        assert_eq!(survivors.len(), 2);
        assert!(survivors.iter().all(|c| c.name != "Tender 1"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stage, FilterStage::InitialAiFilter);
        assert_eq!(records[0].name, "Tender 1");
        assert!(!records[0].reason.is_empty());
    }

    #[tokio::test]
    async fn test_recovers_match_without_id_by_name() {
        let gateway = MockLlmGateway::new(|_| {
            Ok(json!({ "relevant": [{ "name": "Tender 1", "organization": "City 1" }] }))
        });

        let (survivors, records) = run_filter(&gateway, (0..3).map(candidate).collect(), 20)
            .await
            .unwrap();

        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].name, "Tender 1");
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_unmatchable_entry_is_ignored() {
        let gateway = MockLlmGateway::new(|_| {
            Ok(json!({ "relevant": [{ "name": "No Such Tender" }] }))
        });

        let (survivors, records) = run_filter(&gateway, (0..2).map(candidate).collect(), 20)
            .await
            .unwrap();

        assert!(survivors.is_empty());
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_batching_respects_batch_size() {
        let gateway = MockLlmGateway::new(|request| {
            let relevant: Vec<_> =
                listed_ids(&request.user).into_iter().map(|id| json!({ "id": id })).collect();
            Ok(json!({ "relevant": relevant }))
        });

        let (survivors, _) = run_filter(&gateway, (0..5).map(candidate).collect(), 2)
            .await
            .unwrap();

        assert_eq!(survivors.len(), 5);
        assert_eq!(gateway.call_count("initial_filter"), 3);
    }

    #[tokio::test]
    async fn test_schema_violation_surfaces_as_run_error() {
        let gateway = MockLlmGateway::new(|_| Ok(json!({ "unexpected": true })));

        let result = run_filter(&gateway, (0..2).map(candidate).collect(), 20).await;

        assert!(result.is_err());
    }
}

mod description_filter {
    use super::*;

    fn result(i: usize, description: &str) -> TenderAnalysisResult {
        let now = chrono::Utc::now();
        TenderAnalysisResult {
            document_id: format!("doc-{i}"),
            url: format!("https://tenders.example.gov/notice/{i}"),
            name: format!("Tender {i}"),
            organization: format!("City {i}"),
            score: 0.70,
            criteria: vec![],
            description: description.to_string(),
            city: None,
            region: None,
            files: vec![],
            created_at: now,
            updated_at: now,
            opened_at: None,
        }
    }

    #[tokio::test]
    async fn test_rejects_are_archived_with_reason() {
        let gateway = MockLlmGateway::new(|_| {
            Ok(json!({ "verdicts": [
                { "id": 0, "keep": false, "reason": "outside the buyer's sector" },
                { "id": 1, "keep": true }
            ]}))
        });
        let ledger = InMemoryLedger::new();
        let run_entry = ledger
            .create("analysis-run", "analysis-1", Uuid::new_v4())
            .await
            .unwrap();

        let (kept, records) = filters::run_description_filter(
            &gateway,
            &ledger,
            &run_entry,
            &analysis(vec![]),
            vec![result(0, "catering tender"), result(1, "road tender")],
            20,
        )
        .await
        .unwrap();

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Tender 1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stage, FilterStage::AiDescriptionFilter);
        assert_eq!(records[0].reason, "outside the buyer's sector");
    }

    #[tokio::test]
    async fn test_result_without_verdict_is_kept() {
        let gateway = MockLlmGateway::new(|_| Ok(json!({ "verdicts": [] })));
        let ledger = InMemoryLedger::new();
        let run_entry = ledger
            .create("analysis-run", "analysis-1", Uuid::new_v4())
            .await
            .unwrap();

        let (kept, records) = filters::run_description_filter(
            &gateway,
            &ledger,
            &run_entry,
            &analysis(vec![]),
            vec![result(0, "road tender")],
            20,
        )
        .await
        .unwrap();

        assert_eq!(kept.len(), 1);
        assert!(records.is_empty());
    }
}
