//! Rating transform: stored reviews → training signals.
//!
//! Each review's star rating is:
//! 1. decayed exponentially by age (half-life `half_life_days`),
//! 2. boosted by `ln(1 + helpful_votes) * vote_boost_strength`,
//! 3. clamped to `[min_weight, max_weight]`.
//!
//! Age is measured against the `now` passed in, not the time the review was
//! written, so re-running the transform later yields smaller weights for the
//! same review. The transform is pure; the whole corpus can be rebuilt from
//! the stored reviews at any time.

use crate::config::TransformConfig;
use chrono::{DateTime, Utc};
use data_loader::{RatingEvent, RestaurantId, UserId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use tracing::{debug, warn};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// One (user, restaurant, weight) cell of the training matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSignal {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    /// Always within the configured weight bounds ([1, 5] by default)
    pub weight: f64,
}

impl TrainingSignal {
    pub fn new(user_id: impl Into<UserId>, restaurant_id: impl Into<RestaurantId>, weight: f64) -> Self {
        Self {
            user_id: user_id.into(),
            restaurant_id: restaurant_id.into(),
            weight,
        }
    }
}

/// Age of an event in fractional days. Timestamps in the future count as age 0.
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created_at).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).max(0.0)
}

/// `exp(-ln 2 / half_life * age)`.
///
/// A non-positive or non-finite half-life disables decay.
pub fn decay_factor(age_days: f64, half_life_days: f64) -> f64 {
    if !(half_life_days.is_finite() && half_life_days > 0.0) {
        return 1.0;
    }
    (-LN_2 / half_life_days * age_days).exp()
}

pub fn helpfulness_boost(helpful_votes: u32, strength: f64) -> f64 {
    (1.0 + helpful_votes as f64).ln() * strength
}

/// Transform a single review.
///
/// Returns `None` when the review has no usable rating. A missing timestamp
/// skips the decay step but the boost and clamp still apply.
pub fn transform_event(
    event: &RatingEvent,
    now: DateTime<Utc>,
    config: &TransformConfig,
) -> Option<TrainingSignal> {
    let raw_rating = event.raw_rating.filter(|rating| rating.is_finite())?;

    let decayed = match event.created_at {
        Some(created_at) => {
            raw_rating * decay_factor(age_in_days(created_at, now), config.half_life_days)
        }
        None => raw_rating,
    };
    let boosted = decayed + helpfulness_boost(event.helpful_votes, config.vote_boost_strength);
    let weight = boosted.clamp(config.min_weight, config.max_weight);

    Some(TrainingSignal {
        user_id: event.user_id.clone(),
        restaurant_id: event.restaurant_id.clone(),
        weight,
    })
}

/// Transform every review, preserving input order.
///
/// Reviews without a rating are dropped and counted in the log.
pub fn transform_ratings(
    events: &[RatingEvent],
    now: DateTime<Utc>,
    config: &TransformConfig,
) -> Vec<TrainingSignal> {
    let signals: Vec<TrainingSignal> = events
        .par_iter()
        .filter_map(|event| transform_event(event, now, config))
        .collect();

    let dropped = events.len() - signals.len();
    if dropped > 0 {
        warn!("Dropped {} reviews without a usable rating", dropped);
    }
    debug!("Transformed {} reviews into {} training signals", events.len(), signals.len());
    signals
}
