//! Keep only restaurants with a high static rating.

use crate::recommendation::RankedRecommendation;
use crate::traits::Filter;

/// Rating at or above which a restaurant counts as highly rated
pub const DEFAULT_MIN_RATING: f64 = 4.5;

/// Removes restaurants whose static `rating` is below `min_rating`.
///
/// Looks only at the restaurant record, never at the ranking score.
pub struct HighlyRatedFilter {
    min_rating: f64,
}

impl HighlyRatedFilter {
    pub fn new(min_rating: f64) -> Self {
        Self { min_rating }
    }
}

impl Default for HighlyRatedFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RATING)
    }
}

impl Filter for HighlyRatedFilter {
    fn name(&self) -> &str {
        "HighlyRatedFilter"
    }

    fn apply(&self, ranked: Vec<RankedRecommendation>) -> Vec<RankedRecommendation> {
        ranked
            .into_iter()
            .filter(|rec| rec.restaurant.rating >= self.min_rating)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Restaurant;

    #[test]
    fn test_highly_rated_filter() {
        let ranked = vec![
            RankedRecommendation::content_only(Restaurant::new("a", "Thai", 1, 4.0), 3.0),
            RankedRecommendation::content_only(Restaurant::new("b", "Thai", 1, 4.5), 2.0),
            RankedRecommendation::content_only(Restaurant::new("c", "Thai", 1, 4.49), 1.0),
            RankedRecommendation::content_only(Restaurant::new("d", "Thai", 1, 4.9), 0.0),
        ];

        let filtered = HighlyRatedFilter::default().apply(ranked);
        let ids: Vec<&str> = filtered.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "d"]);
    }
}
