use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// No scorable weight: either every definition is excluded from scoring
    /// or the included weights sum to zero. A configuration error, raised
    /// before any division.
    #[error("total scorable criterion weight is zero ({included} included, {excluded} excluded)")]
    NoScorableWeight { included: usize, excluded: usize },

    #[error("invalid scoring shares: base {base} + weighted {weighted} != 1.0")]
    InvalidShares { base: f64, weighted: f64 },
}
