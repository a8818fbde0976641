//! Server crate for the restaurant recommendation engine.
//!
//! This crate contains the orchestrator that owns the data snapshot, the
//! shared model handle and the recommendation cache, plus the engine-wide
//! configuration.

pub mod cache;
pub mod config;
pub mod orchestrator;

pub use cache::{CacheStats, CachedList, RecommendationCache};
pub use config::{ConfigError, DEFAULT_CACHE_TTL_SECS, EngineConfig};
pub use orchestrator::{RecommendationOrchestrator, TrainingSummary};
