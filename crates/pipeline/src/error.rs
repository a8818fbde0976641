//! Error types for ranking.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    /// No trained model exists (the training corpus was empty).
    ///
    /// Callers surface this as "service unavailable"; the ranker never
    /// substitutes content-only results for it.
    #[error("Recommendation model is unavailable")]
    ModelUnavailable,

    #[error("Invalid ranker configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RankingError>;
