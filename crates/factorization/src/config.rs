//! Tunable parameters for the rating transform and the factor model.
//!
//! Both structs deserialize with every field optional, so a config file only
//! needs to mention what it overrides.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the review-to-training-signal transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Days after which a review's weight is halved
    pub half_life_days: f64,
    /// Multiplier applied to `ln(1 + helpful_votes)`
    pub vote_boost_strength: f64,
    pub min_weight: f64,
    pub max_weight: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            half_life_days: 60.0,
            vote_boost_strength: 0.1,
            min_weight: 1.0,
            max_weight: 5.0,
        }
    }
}

impl TransformConfig {
    pub fn with_half_life_days(mut self, days: f64) -> Self {
        self.half_life_days = days;
        self
    }

    pub fn with_vote_boost_strength(mut self, strength: f64) -> Self {
        self.vote_boost_strength = strength;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.vote_boost_strength.is_finite() {
            return Err(ModelError::InvalidConfig(format!(
                "vote_boost_strength must be finite, got {}",
                self.vote_boost_strength
            )));
        }
        if !(self.min_weight.is_finite()
            && self.max_weight.is_finite()
            && self.min_weight <= self.max_weight)
        {
            return Err(ModelError::InvalidConfig(format!(
                "weight bounds must be finite with min <= max, got [{}, {}]",
                self.min_weight, self.max_weight
            )));
        }
        Ok(())
    }
}

/// Hyperparameters of the biased SGD factorization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_factors: usize,
    pub n_epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty applied to biases and factors alike
    pub regularization: f64,
    /// Standard deviation of the normal distribution factors start from
    pub init_std: f64,
    /// Fixed seed for reproducible training; `None` draws one per run
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_factors: 100,
            n_epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            init_std: 0.1,
            seed: None,
        }
    }
}

impl ModelConfig {
    pub fn with_factors(mut self, n_factors: usize) -> Self {
        self.n_factors = n_factors;
        self
    }

    pub fn with_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_epochs == 0 {
            return Err(ModelError::InvalidConfig("n_epochs must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "regularization must be non-negative, got {}",
                self.regularization
            )));
        }
        if !(self.init_std.is_finite() && self.init_std >= 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "init_std must be non-negative, got {}",
                self.init_std
            )));
        }
        Ok(())
    }
}
