//! # Factorization Crate
//!
//! The learned half of the hybrid recommender.
//!
//! ## Components
//!
//! ### Rating transform
//! Turns stored reviews into training signals: time decay with a 60-day
//! half-life, a small boost for helpful votes, and a clamp to [1, 5].
//!
//! ### Latent factor model
//! Biased matrix factorization fitted by SGD over every training signal.
//! Predicts a rating for any (user, restaurant) pair, falling back to bias
//! terms for ids it never saw.
//!
//! ### Model handle
//! Owns the current model behind an `Arc` and swaps it atomically on
//! retrain.
//!
//! ## Example Usage
//!
//! ```ignore
//! use factorization::{transform_ratings, ModelConfig, ModelHandle, TransformConfig};
//!
//! let signals = transform_ratings(index.rating_events(), Utc::now(), &TransformConfig::default());
//! let handle = ModelHandle::new();
//! handle.retrain(&signals, &ModelConfig::default())?;
//!
//! if let Some(model) = handle.snapshot() {
//!     let estimate = model.predict("alice", "r2");
//! }
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod model;
pub mod predictor;
pub mod transform;

pub use config::{ModelConfig, TransformConfig};
pub use error::{ModelError, Result};
pub use handle::ModelHandle;
pub use model::LatentFactorModel;
pub use predictor::RatingPredictor;
pub use transform::{TrainingSignal, transform_event, transform_ratings};
