use std::collections::HashMap;

use tracing::{debug, warn};

use super::error::ScoringError;
use super::types::{CriterionDefinition, CriterionResult};
use super::{DEFAULT_BASE_SHARE, DEFAULT_CRITERION_WEIGHT, DEFAULT_WEIGHTED_SHARE};

/// Scoring knobs. The 0.40/0.60 split is hand-tuned for behavioral
/// compatibility with historical scores; treat it as configuration.
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    /// Fixed share awarded to every scored tender.
    pub base_share: f64,
    /// Share distributed proportionally to achieved criterion weight.
    pub weighted_share: f64,
    /// Weight applied to definitions that omit one.
    pub default_weight: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_share: DEFAULT_BASE_SHARE,
            weighted_share: DEFAULT_WEIGHTED_SHARE,
            default_weight: DEFAULT_CRITERION_WEIGHT,
        }
    }
}

/// Deterministic confidence-weighted relevance scorer.
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    config: ScoringConfig,
}

impl RelevanceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Validates that `definitions` can produce a score at all. Run this
    /// before processing any tender so a bad configuration aborts the run
    /// up front instead of failing every item.
    pub fn validate_definitions(
        &self,
        definitions: &[CriterionDefinition],
    ) -> Result<(), ScoringError> {
        self.total_weight(definitions).map(|_| ())
    }

    /// Computes the relevance score in `[base_share, 1.0]`, rounded to two
    /// decimal places. Pure: identical inputs always yield the identical
    /// score.
    ///
    /// Results whose name matches no non-excluded definition are ignored
    /// here (they are still stored for display by the caller).
    pub fn score(
        &self,
        results: &[CriterionResult],
        definitions: &[CriterionDefinition],
    ) -> Result<f64, ScoringError> {
        if (self.config.base_share + self.config.weighted_share - 1.0).abs() > f64::EPSILON {
            return Err(ScoringError::InvalidShares {
                base: self.config.base_share,
                weighted: self.config.weighted_share,
            });
        }

        let total_weight = self.total_weight(definitions)?;

        let scorable: HashMap<&str, u32> = definitions
            .iter()
            .filter(|d| !d.exclude_from_score)
            .map(|d| (d.name.as_str(), self.weight_of(d)))
            .collect();

        let mut achieved_weight: u64 = 0;
        for result in results {
            let Some(&weight) = scorable.get(result.criteria.as_str()) else {
                debug!(
                    criteria = %result.criteria,
                    "criterion result not scorable (unknown or excluded), ignoring"
                );
                continue;
            };

            if result.effective_met() {
                achieved_weight += u64::from(weight);
            }
        }

        let weighted = achieved_weight as f64 / total_weight as f64 * self.config.weighted_share;
        let score = self.config.base_share + weighted;

        Ok((score * 100.0).round() / 100.0)
    }

    fn weight_of(&self, definition: &CriterionDefinition) -> u32 {
        definition.weight.unwrap_or(self.config.default_weight)
    }

    fn total_weight(&self, definitions: &[CriterionDefinition]) -> Result<u64, ScoringError> {
        let included: Vec<_> = definitions.iter().filter(|d| !d.exclude_from_score).collect();
        let total: u64 = included.iter().map(|d| u64::from(self.weight_of(d))).sum();

        if total == 0 {
            return Err(ScoringError::NoScorableWeight {
                included: included.len(),
                excluded: definitions.len() - included.len(),
            });
        }

        Ok(total)
    }
}

/// Realigns evaluator-returned criterion names with their canonical
/// definitions by position.
///
/// Name correlation is unreliable after a generative step (the evaluator may
/// paraphrase), so position in the definition list is the source of truth;
/// every overwrite is logged.
pub fn align_result_names(
    results: &mut [CriterionResult],
    definitions: &[CriterionDefinition],
) {
    if results.len() != definitions.len() {
        warn!(
            results = results.len(),
            definitions = definitions.len(),
            "criterion result count differs from definition count, aligning common prefix"
        );
    }

    for (result, definition) in results.iter_mut().zip(definitions.iter()) {
        if result.criteria != definition.name {
            warn!(
                returned = %result.criteria,
                canonical = %definition.name,
                "criterion name mismatch from evaluator, overwriting with canonical name"
            );
            result.criteria = definition.name.clone();
        }
    }
}
