//! Error types for the factorization crate.

use thiserror::Error;

/// Errors raised by the latent factor model.
///
/// Prediction itself never fails; these come from configuration checks and
/// from the raw-id to internal-index lookups, which callers must guard.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown user id: {0}")]
    UnknownUser(String),

    #[error("Unknown restaurant id: {0}")]
    UnknownItem(String),

    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
