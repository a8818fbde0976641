//! The seam between a trained model and the ranker.

use crate::model::LatentFactorModel;

/// Anything that can estimate a user's rating for a restaurant.
///
/// ## Design Note
/// - `Send + Sync` so one predictor can serve concurrent ranking requests
/// - `predict` must not fail on unseen ids; callers only use `has_user` to
///   pick a ranking mode
pub trait RatingPredictor: Send + Sync {
    /// Whether the user contributed to training
    fn has_user(&self, user_id: &str) -> bool;

    /// Estimated rating, not clamped to the rating scale
    fn predict(&self, user_id: &str, restaurant_id: &str) -> f64;
}

impl RatingPredictor for LatentFactorModel {
    fn has_user(&self, user_id: &str) -> bool {
        LatentFactorModel::has_user(self, user_id)
    }

    fn predict(&self, user_id: &str, restaurant_id: &str) -> f64 {
        LatentFactorModel::predict(self, user_id, restaurant_id)
    }
}
