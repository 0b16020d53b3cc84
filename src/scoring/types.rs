use serde::{Deserialize, Serialize};

/// Evaluator confidence attached to a criterion judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A named, weighted evaluation question applied to a tender's extracted
/// text. Immutable once an analysis run starts.
///
/// Optional fields default at construction time; call sites never probe for
/// their presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionDefinition {
    /// Unique key; also the correlation id back to evaluator output.
    pub name: String,

    /// Instruction text presented to the evaluator.
    pub description: String,

    /// Relative weight. `None` means the configured default applies at
    /// scoring time.
    #[serde(default)]
    pub weight: Option<u32>,

    /// Failing this criterion should exclude the tender regardless of score.
    /// Flagged on the result; enforcement is caller policy.
    #[serde(default)]
    pub is_disqualifying: bool,

    /// Stored and displayed, but not part of the weighted score.
    #[serde(default)]
    pub exclude_from_score: bool,

    /// Extra evaluator instruction.
    #[serde(default)]
    pub instruction: Option<String>,

    /// Sub-queries used for semantic retrieval.
    #[serde(default)]
    pub subcriteria: Vec<String>,

    /// Keywords used for semantic retrieval.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CriterionDefinition {
    /// A definition with only the required fields set.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            weight: None,
            is_disqualifying: false,
            exclude_from_score: false,
            instruction: None,
            subcriteria: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Sets an explicit weight.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Marks the criterion as disqualifying.
    pub fn disqualifying(mut self) -> Self {
        self.is_disqualifying = true;
        self
    }

    /// Excludes the criterion from the weighted score.
    pub fn excluded_from_score(mut self) -> Self {
        self.exclude_from_score = true;
        self
    }

    /// Queries used for semantic retrieval: the subcriteria when present,
    /// otherwise the description, plus the keywords as one extra query.
    pub fn retrieval_queries(&self) -> Vec<String> {
        let mut queries = if self.subcriteria.is_empty() {
            vec![self.description.clone()]
        } else {
            self.subcriteria.clone()
        };
        if !self.keywords.is_empty() {
            queries.push(self.keywords.join(" "));
        }
        queries
    }
}

/// One evaluator judgment for one criterion of one tender. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    /// Criterion name; must equal a [`CriterionDefinition::name`] after
    /// alignment.
    pub criteria: String,

    /// Evaluator's summary of the evidence.
    pub summary: String,

    /// Evaluator confidence.
    pub confidence: Confidence,

    /// Explicit boolean judgment; `None` when the evaluator omitted one.
    #[serde(default)]
    pub criteria_met: Option<bool>,
}

impl CriterionResult {
    /// The boolean used for scoring: the explicit judgment when present,
    /// otherwise a confidence-derived fallback (`true` only for HIGH).
    pub fn effective_met(&self) -> bool {
        self.criteria_met.unwrap_or(self.confidence == Confidence::High)
    }
}
