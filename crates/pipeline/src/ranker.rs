//! Hybrid ranking: content-only for cold-start users, blended otherwise.
//!
//! ## Algorithm
//! 1. Drop restaurants the user favourited or disliked
//! 2. Pick a mode:
//!    - content-only if the user has fewer than `review_threshold` reviews or
//!      the model never saw them
//!    - hybrid otherwise
//! 3. Score every remaining restaurant:
//!    - content-only: `content_score`
//!    - hybrid: `alpha * (predicted - 1) / 4 + beta * content / 3`
//! 4. Stable sort, highest score first
//! 5. Apply the requested filter (after ranking, order preserved)
//!
//! The full list is returned; callers decide how much of it to show.

use crate::content::{MAX_CONTENT_SCORE, content_score};
use crate::error::{RankingError, Result};
use crate::filters::FilterMode;
use crate::filters::highly_rated::DEFAULT_MIN_RATING;
use crate::recommendation::{RankedRecommendation, RankingMode};
use data_loader::{Restaurant, RestaurantId, UserPreferences};
use factorization::RatingPredictor;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Lowest and span of the rating scale predictions are normalized against
const RATING_FLOOR: f64 = 1.0;
const RATING_SPAN: f64 = 4.0;

/// Blending weights and thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Weight of the normalized model prediction
    pub alpha: f64,
    /// Weight of the normalized content score
    pub beta: f64,
    /// Users with fewer reviews than this get content-only rankings
    pub review_threshold: usize,
    pub highly_rated_min_rating: f64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            beta: 0.1,
            review_threshold: 3,
            highly_rated_min_rating: DEFAULT_MIN_RATING,
        }
    }
}

impl RankerConfig {
    pub fn with_weights(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn with_review_threshold(mut self, threshold: usize) -> Self {
        self.review_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(RankingError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        if !self.highly_rated_min_rating.is_finite() {
            return Err(RankingError::InvalidConfig(format!(
                "highly_rated_min_rating must be finite, got {}",
                self.highly_rated_min_rating
            )));
        }
        Ok(())
    }
}

/// Everything the ranker needs about one user, already fetched
#[derive(Debug, Clone, Copy)]
pub struct RankingRequest<'a> {
    pub user_id: &'a str,
    pub preferences: Option<&'a UserPreferences>,
    /// Candidate restaurants in enumeration order; ties keep this order
    pub restaurants: &'a [Restaurant],
    /// Favourited or disliked restaurants, never returned
    pub excluded: &'a HashSet<RestaurantId>,
    pub review_count: usize,
    pub filter: FilterMode,
}

/// Stateless per request; one instance can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct HybridRanker {
    config: RankerConfig,
}

impl HybridRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Which mode a request will be scored in
    pub fn select_mode(&self, request: &RankingRequest<'_>, model: &dyn RatingPredictor) -> RankingMode {
        if request.review_count < self.config.review_threshold || !model.has_user(request.user_id) {
            RankingMode::ContentOnly
        } else {
            RankingMode::Hybrid
        }
    }

    /// Rank every eligible restaurant for one user.
    ///
    /// `model` is `None` when training produced no model; that is reported
    /// as [`RankingError::ModelUnavailable`] for every user.
    #[instrument(skip(self, request, model), fields(user_id = request.user_id, filter = %request.filter))]
    pub fn rank(
        &self,
        request: &RankingRequest<'_>,
        model: Option<&dyn RatingPredictor>,
    ) -> Result<Vec<RankedRecommendation>> {
        let model = model.ok_or(RankingError::ModelUnavailable)?;

        let candidates: Vec<&Restaurant> = request
            .restaurants
            .iter()
            .filter(|restaurant| !request.excluded.contains(&restaurant.id))
            .collect();
        debug!(
            "{} candidates after excluding {} interactions",
            candidates.len(),
            request.restaurants.len() - candidates.len()
        );

        let mode = self.select_mode(request, model);
        let mut ranked = match mode {
            RankingMode::ContentOnly => {
                let Some(prefs) = request.preferences else {
                    debug!("No preferences for cold-start user; nothing to rank");
                    return Ok(Vec::new());
                };
                self.score_content_only(&candidates, prefs)
            }
            RankingMode::Hybrid => self.score_hybrid(&candidates, request, model),
        };

        // Vec::sort_by is stable: equal scores keep enumeration order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let ranked = request
            .filter
            .pipeline(self.config.highly_rated_min_rating)
            .apply(ranked);

        debug!("Ranked {} restaurants in {:?} mode", ranked.len(), mode);
        Ok(ranked)
    }

    fn score_content_only(
        &self,
        candidates: &[&Restaurant],
        prefs: &UserPreferences,
    ) -> Vec<RankedRecommendation> {
        candidates
            .par_iter()
            .map(|&restaurant| {
                let content = content_score(Some(restaurant), Some(prefs));
                RankedRecommendation::content_only(restaurant.clone(), content)
            })
            .collect()
    }

    fn score_hybrid(
        &self,
        candidates: &[&Restaurant],
        request: &RankingRequest<'_>,
        model: &dyn RatingPredictor,
    ) -> Vec<RankedRecommendation> {
        candidates
            .par_iter()
            .map(|&restaurant| {
                let predicted = model.predict(request.user_id, &restaurant.id);
                let content = content_score(Some(restaurant), request.preferences);
                let final_score = self.blend(predicted, content);
                RankedRecommendation::hybrid(restaurant.clone(), predicted, content, final_score)
            })
            .collect()
    }

    /// `alpha * normalized prediction + beta * normalized content`.
    ///
    /// The prediction is normalized as-is; it is not clamped to [1, 5] first.
    pub fn blend(&self, predicted: f64, content: f64) -> f64 {
        let norm_pred = (predicted - RATING_FLOOR) / RATING_SPAN;
        let norm_content = content / MAX_CONTENT_SCORE;
        self.config.alpha * norm_pred + self.config.beta * norm_content
    }
}
