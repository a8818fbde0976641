//! Content-based scoring from explicit user preferences.
//!
//! +2 when the restaurant's cuisine is one of the user's cuisines, plus a
//! price-proximity term: +1 for the exact tier, +0.5 for one tier away.

use data_loader::{PriceValue, Restaurant, UserPreferences};

/// Highest score `content_score` can return. The hybrid ranker normalizes by it.
pub const MAX_CONTENT_SCORE: f64 = 3.0;

const CUISINE_MATCH: f64 = 2.0;
const EXACT_PRICE: f64 = 1.0;
const NEAR_PRICE: f64 = 0.5;

/// Preference affinity of a restaurant, in `[0, MAX_CONTENT_SCORE]`.
///
/// Returns 0 when either side is missing. Price tiers that cannot be read
/// as integers contribute nothing.
pub fn content_score(restaurant: Option<&Restaurant>, prefs: Option<&UserPreferences>) -> f64 {
    let (Some(restaurant), Some(prefs)) = (restaurant, prefs) else {
        return 0.0;
    };

    let mut score = 0.0;
    if prefs.cuisines.contains(&restaurant.cuisine_type) {
        score += CUISINE_MATCH;
    }
    score += price_proximity(
        restaurant.price_level.as_ref(),
        prefs.price_range.as_ref(),
    );
    score
}

fn price_proximity(level: Option<&PriceValue>, wanted: Option<&PriceValue>) -> f64 {
    let (Some(level), Some(wanted)) = (
        level.and_then(PriceValue::as_level),
        wanted.and_then(PriceValue::as_level),
    ) else {
        return 0.0;
    };
    match level.abs_diff(wanted) {
        0 => EXACT_PRICE,
        1 => NEAR_PRICE,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn italian(price_level: i64) -> Restaurant {
        Restaurant::new("1", "Italian", price_level, 4.0)
    }

    fn prefs(price_range: &str) -> UserPreferences {
        UserPreferences::new(["Italian", "Thai"], price_range)
    }

    #[test]
    fn test_cuisine_and_exact_price() {
        assert_eq!(content_score(Some(&italian(2)), Some(&prefs("2"))), 3.0);
    }

    #[test]
    fn test_cuisine_and_price_off_by_one() {
        assert_eq!(content_score(Some(&italian(3)), Some(&prefs("2"))), 2.5);
        assert_eq!(content_score(Some(&italian(1)), Some(&prefs("2"))), 2.5);
    }

    #[test]
    fn test_price_only() {
        let japanese = Restaurant::new("2", "Japanese", 2, 4.9);
        assert_eq!(content_score(Some(&japanese), Some(&prefs("2"))), 1.0);
        assert_eq!(content_score(Some(&japanese), Some(&prefs("3"))), 0.5);
        assert_eq!(content_score(Some(&japanese), Some(&prefs("4"))), 0.0);
    }

    #[test]
    fn test_missing_inputs_score_zero() {
        assert_eq!(content_score(None, Some(&prefs("2"))), 0.0);
        assert_eq!(content_score(Some(&italian(2)), None), 0.0);
        assert_eq!(content_score(None, None), 0.0);
    }

    #[test]
    fn test_non_numeric_price_contributes_nothing() {
        assert_eq!(content_score(Some(&italian(2)), Some(&prefs("$$"))), 2.0);

        let mut unpriced = italian(2);
        unpriced.price_level = None;
        assert_eq!(content_score(Some(&unpriced), Some(&prefs("2"))), 2.0);
    }

    #[test]
    fn test_score_stays_in_bounds() {
        for level in -2..8 {
            for range in ["-1", "0", "1", "2", "3", "4", "x", ""] {
                for cuisine in ["Italian", "French"] {
                    let restaurant = Restaurant::new("r", cuisine, level, 4.0);
                    let score = content_score(Some(&restaurant), Some(&prefs(range)));
                    assert!((0.0..=MAX_CONTENT_SCORE).contains(&score));
                }
            }
        }
    }
}
