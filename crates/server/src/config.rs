//! Engine-wide configuration, loadable from a JSON file.
//!
//! Every section and field is optional in the file; omitted values keep
//! their defaults.
//!
//! ```json
//! {
//!   "transform": { "half_life_days": 30 },
//!   "model": { "n_factors": 20, "seed": 42 },
//!   "ranker": { "alpha": 0.8, "beta": 0.2 },
//!   "cache_ttl_secs": 300
//! }
//! ```

use factorization::{ModelConfig, TransformConfig};
use pipeline::RankerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error(transparent)]
    Model(#[from] factorization::ModelError),

    #[error(transparent)]
    Ranker(#[from] pipeline::RankingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub transform: TransformConfig,
    pub model: ModelConfig,
    pub ranker: RankerConfig,
    /// How long a cached recommendation list stays valid
    pub cache_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transform: TransformConfig::default(),
            model: ModelConfig::default(),
            ranker: RankerConfig::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transform.validate()?;
        self.model.validate()?;
        self.ranker.validate()?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn with_ranker(mut self, ranker: RankerConfig) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }
}
