use super::scorer::{RelevanceScorer, ScoringConfig, align_result_names};
use super::types::{Confidence, CriterionDefinition, CriterionResult};
use super::{DEFAULT_BASE_SHARE, ScoringError};

fn definition(name: &str, weight: Option<u32>, exclude: bool) -> CriterionDefinition {
    let mut def = CriterionDefinition::new(name, format!("description for {name}"));
    def.weight = weight;
    def.exclude_from_score = exclude;
    def
}

fn result(name: &str, met: Option<bool>, confidence: Confidence) -> CriterionResult {
    CriterionResult {
        criteria: name.to_string(),
        summary: format!("summary for {name}"),
        confidence,
        criteria_met: met,
    }
}

#[test]
fn test_worked_example() {
    // weights 5 (met) + 3 (excluded) + 5 (unmet): total 10, achieved 5.
    let definitions = vec![
        definition("a", Some(5), false),
        definition("b", Some(3), true),
        definition("c", Some(5), false),
    ];
    let results = vec![
        result("a", Some(true), Confidence::High),
        result("b", Some(false), Confidence::High),
        result("c", Some(false), Confidence::Low),
    ];

    let score = RelevanceScorer::default().score(&results, &definitions).unwrap();
    assert_eq!(score, 0.70);
}

#[test]
fn test_score_bounds() {
    let definitions = vec![
        definition("a", Some(5), false),
        definition("b", Some(2), false),
        definition("c", None, false),
    ];
    let scorer = RelevanceScorer::default();

    let all_unmet: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|n| result(n, Some(false), Confidence::Low))
        .collect();
    let all_met: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|n| result(n, Some(true), Confidence::High))
        .collect();

    assert_eq!(scorer.score(&all_unmet, &definitions).unwrap(), DEFAULT_BASE_SHARE);
    assert_eq!(scorer.score(&all_met, &definitions).unwrap(), 1.00);
}

#[test]
fn test_score_determinism() {
    let definitions = vec![
        definition("a", Some(4), false),
        definition("b", Some(7), false),
        definition("c", Some(1), true),
    ];
    let results = vec![
        result("a", Some(true), Confidence::Medium),
        result("b", None, Confidence::High),
        result("c", Some(true), Confidence::High),
    ];

    let scorer = RelevanceScorer::default();
    let first = scorer.score(&results, &definitions).unwrap();
    let second = scorer.score(&results, &definitions).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_confidence_fallback_only_when_judgment_omitted() {
    let definitions = vec![definition("a", Some(10), false)];

    // Omitted judgment, HIGH confidence: counts as met.
    let high = vec![result("a", None, Confidence::High)];
    // Omitted judgment, MEDIUM confidence: counts as unmet.
    let medium = vec![result("a", None, Confidence::Medium)];
    // Explicit false beats HIGH confidence.
    let explicit = vec![result("a", Some(false), Confidence::High)];

    let scorer = RelevanceScorer::default();
    assert_eq!(scorer.score(&high, &definitions).unwrap(), 1.00);
    assert_eq!(scorer.score(&medium, &definitions).unwrap(), 0.40);
    assert_eq!(scorer.score(&explicit, &definitions).unwrap(), 0.40);
}

#[test]
fn test_default_weight_applied_to_omitted() {
    // One omitted weight (defaults to 3) plus one explicit 3: met half.
    let definitions = vec![
        definition("a", None, false),
        definition("b", Some(3), false),
    ];
    let results = vec![
        result("a", Some(true), Confidence::High),
        result("b", Some(false), Confidence::Low),
    ];

    let score = RelevanceScorer::default().score(&results, &definitions).unwrap();
    assert_eq!(score, 0.70);
}

#[test]
fn test_no_scorable_weight_all_excluded() {
    let definitions = vec![
        definition("a", Some(5), true),
        definition("b", Some(3), true),
    ];

    let err = RelevanceScorer::default()
        .score(&[], &definitions)
        .unwrap_err();
    assert!(matches!(err, ScoringError::NoScorableWeight { included: 0, excluded: 2 }));
}

#[test]
fn test_no_scorable_weight_zero_weights() {
    let scorer = RelevanceScorer::new(ScoringConfig {
        default_weight: 0,
        ..Default::default()
    });
    let definitions = vec![definition("a", None, false), definition("b", Some(0), false)];

    let err = scorer.score(&[], &definitions).unwrap_err();
    assert!(matches!(err, ScoringError::NoScorableWeight { .. }));
}

#[test]
fn test_no_scorable_weight_empty_definitions() {
    let err = RelevanceScorer::default().score(&[], &[]).unwrap_err();
    assert!(matches!(err, ScoringError::NoScorableWeight { .. }));
}

#[test]
fn test_validate_definitions_fails_fast() {
    let scorer = RelevanceScorer::default();

    assert!(scorer.validate_definitions(&[definition("a", Some(1), false)]).is_ok());
    assert!(scorer.validate_definitions(&[definition("a", Some(1), true)]).is_err());
}

#[test]
fn test_unknown_result_names_are_ignored() {
    let definitions = vec![definition("a", Some(5), false)];
    let results = vec![
        result("a", Some(true), Confidence::High),
        result("phantom", Some(true), Confidence::High),
    ];

    let score = RelevanceScorer::default().score(&results, &definitions).unwrap();
    assert_eq!(score, 1.00);
}

#[test]
fn test_excluded_results_do_not_contribute() {
    let definitions = vec![
        definition("a", Some(5), false),
        definition("b", Some(100), true),
    ];
    let results = vec![
        result("a", Some(false), Confidence::Low),
        result("b", Some(true), Confidence::High),
    ];

    let score = RelevanceScorer::default().score(&results, &definitions).unwrap();
    assert_eq!(score, 0.40);
}

#[test]
fn test_rounded_to_two_decimals() {
    // 1 of 3 equal weights met: 0.40 + 0.60/3 = 0.60.
    let definitions = vec![
        definition("a", Some(1), false),
        definition("b", Some(1), false),
        definition("c", Some(1), false),
    ];
    let results = vec![
        result("a", Some(true), Confidence::High),
        result("b", Some(false), Confidence::Low),
        result("c", Some(false), Confidence::Low),
    ];

    let score = RelevanceScorer::default().score(&results, &definitions).unwrap();
    assert_eq!(score, 0.60);
}

#[test]
fn test_align_overwrites_paraphrased_names() {
    let definitions = vec![
        definition("iso-certifications", Some(1), false),
        definition("delivery-deadline", Some(1), false),
    ];
    let mut results = vec![
        result("ISO certification requirements", Some(true), Confidence::High),
        result("delivery-deadline", Some(true), Confidence::High),
    ];

    align_result_names(&mut results, &definitions);

    assert_eq!(results[0].criteria, "iso-certifications");
    assert_eq!(results[1].criteria, "delivery-deadline");
}

#[test]
fn test_align_handles_length_mismatch() {
    let definitions = vec![definition("a", Some(1), false)];
    let mut results = vec![
        result("x", Some(true), Confidence::High),
        result("y", Some(false), Confidence::Low),
    ];

    align_result_names(&mut results, &definitions);

    assert_eq!(results[0].criteria, "a");
    // The unmatched tail keeps its name; scoring ignores it.
    assert_eq!(results[1].criteria, "y");
}
