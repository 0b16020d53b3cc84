//! Batch binary: runs one analysis end to end and prints the run summary.
//!
//! The analysis configuration is loaded from a JSON file
//! (`TENDERSIFT_ANALYSIS_PATH`) into the embedded store; collaborator
//! endpoints come from `TENDERSIFT_*` environment variables.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tendersift::chunker::{Chunker, ChunkerConfig, TokenCounter};
use tendersift::config::Config;
use tendersift::embedding::{DEFAULT_EMBEDDING_DIM, HttpEmbedder};
use tendersift::extraction::HttpExtractor;
use tendersift::gateway::GenaiGateway;
use tendersift::ledger::InMemoryLedger;
use tendersift::pipeline::{AnalysisPipeline, PipelineConfig, RunnerConfig, StageRunner};
use tendersift::scoring::{RelevanceScorer, ScoringConfig};
use tendersift::search::HttpSearch;
use tendersift::storage::{AnalysisConfig, InMemoryStore};
use tendersift::vectordb::QdrantIndex;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let analysis_path = std::env::var("TENDERSIFT_ANALYSIS_PATH")
        .context("TENDERSIFT_ANALYSIS_PATH must point to an analysis JSON file")?;
    let analysis: AnalysisConfig = serde_json::from_str(
        &std::fs::read_to_string(&analysis_path)
            .with_context(|| format!("reading {analysis_path}"))?,
    )
    .with_context(|| format!("parsing {analysis_path}"))?;
    let analysis_id = analysis.id.clone();

    info!(
        analysis = %analysis_id,
        criteria = analysis.criteria.len(),
        workers = config.worker_limit,
        "tendersift starting"
    );

    let retry = config.retry_policy();

    let token_counter = match &config.tokenizer_path {
        Some(path) => TokenCounter::from_file(path).context("loading tokenizer")?,
        None => TokenCounter::CharsPerToken(4),
    };
    let chunker = Chunker::new(
        token_counter,
        ChunkerConfig {
            max_tokens: config.chunk_max_tokens,
            canonical_score_threshold: config.canonical_score_threshold,
        },
    );

    let scorer = RelevanceScorer::new(ScoringConfig {
        base_share: config.score_base_share,
        weighted_share: config.score_weighted_share,
        default_weight: config.default_criterion_weight,
    });

    let embedder = Arc::new(
        HttpEmbedder::new(
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            DEFAULT_EMBEDDING_DIM,
            config.request_timeout,
            retry,
        )
        .context("building embedder")?,
    );
    let index = Arc::new(
        QdrantIndex::connect(&config.qdrant_url, config.collection_name.clone(), embedder)
            .await
            .context("connecting to Qdrant")?,
    );

    let gateway = Arc::new(GenaiGateway::new(
        config.llm_model.clone(),
        config.request_timeout,
        retry,
    ));
    let extractor = Arc::new(
        HttpExtractor::new(config.extraction_url.clone(), config.request_timeout, retry)
            .context("building extractor")?,
    );
    let search = Arc::new(
        HttpSearch::new(config.search_url.clone(), config.request_timeout, retry)
            .context("building search client")?,
    );

    let store = Arc::new(InMemoryStore::new().with_analysis(analysis));
    let ledger = Arc::new(InMemoryLedger::new());

    let runner = Arc::new(StageRunner::new(
        extractor.clone(),
        index,
        gateway.clone(),
        ledger.clone(),
        chunker,
        scorer.clone(),
        RunnerConfig {
            top_k: config.retrieval_top_k,
            score_threshold: config.retrieval_score_threshold,
        },
    ));

    let pipeline = AnalysisPipeline::new(
        store.clone(),
        search,
        gateway,
        ledger,
        extractor,
        runner,
        scorer,
        PipelineConfig {
            worker_limit: config.worker_limit,
            filter_batch_size: config.filter_batch_size,
        },
    );

    let summary = pipeline.run(&analysis_id).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    for result in store.results(&analysis_id) {
        info!(
            tender = %result.url,
            score = result.score,
            "persisted result"
        );
    }

    Ok(())
}
