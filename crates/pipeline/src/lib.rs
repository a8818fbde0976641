//! Hybrid ranking of restaurants for one user.
//!
//! This crate provides:
//! - `content_score` for preference affinity
//! - `HybridRanker`, which picks content-only or hybrid scoring per user
//! - Filter trait and `FilterPipeline` for post-ranking filters
//! - `FilterMode`, the closed set of filters callers can request
//!
//! ## Architecture
//! A request is processed in stages:
//! 1. Favourited and disliked restaurants are removed from the pool
//! 2. Each remaining restaurant is scored (content-only or hybrid)
//! 3. The list is stable-sorted by score, highest first
//! 4. The requested filter drops entries without reordering
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterMode, HybridRanker, RankerConfig, RankingRequest};
//!
//! let excluded = index.excluded_restaurants("alice");
//! let request = RankingRequest {
//!     user_id: "alice",
//!     preferences: index.get_preferences("alice"),
//!     restaurants: index.restaurants(),
//!     excluded: &excluded,
//!     review_count: index.review_count("alice"),
//!     filter: FilterMode::parse("Highly Rated"),
//! };
//!
//! let model = handle.snapshot();
//! let ranker = HybridRanker::new(RankerConfig::default());
//! let ranked = ranker.rank(&request, model.as_deref().map(|m| m as _))?;
//! ```

pub mod content;
pub mod error;
pub mod filter_pipeline;
pub mod filters;
pub mod ranker;
pub mod recommendation;
pub mod traits;

// Re-export main types
pub use content::{MAX_CONTENT_SCORE, content_score};
pub use error::{RankingError, Result};
pub use filter_pipeline::FilterPipeline;
pub use filters::{FilterMode, HighlyRatedFilter};
pub use ranker::{HybridRanker, RankerConfig, RankingRequest};
pub use recommendation::{RankedRecommendation, RankingMode, ScoreComponents};
pub use traits::Filter;
