//! Core domain types for the restaurant recommendation dataset.
//!
//! This module defines the records handed to the recommendation engine by the
//! data layer, plus the `DataIndex` that keeps them in memory.
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (UserId, RestaurantId)
//! - `#[serde(untagged)]` enums for loosely typed document fields
//! - `#[serde(flatten)]` to pass unknown fields through untouched
//! - HashMap and HashSet indices for efficient lookups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================
// Document ids from the data layer are opaque strings

/// Unique identifier for a user
pub type UserId = String;

/// Unique identifier for a restaurant
pub type RestaurantId = String;

// =============================================================================
// Price values
// =============================================================================

/// A price tier as stored by the data layer.
///
/// Restaurants store `priceLevel` as a number while preference documents
/// store `priceRange` as a string such as `"2"`. Both are accepted and
/// coerced to an integer tier with [`PriceValue::as_level`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl PriceValue {
    /// Coerce to an integer price tier.
    ///
    /// Strings are read up to the first non-digit (`"2"` and `"2.7"` both
    /// give 2), floats are truncated. Anything without a leading integer,
    /// or a non-finite float, yields `None`.
    pub fn as_level(&self) -> Option<i64> {
        match self {
            PriceValue::Integer(value) => Some(*value),
            PriceValue::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            PriceValue::Float(_) => None,
            PriceValue::Text(text) => parse_leading_integer(text),
        }
    }
}

impl From<i64> for PriceValue {
    fn from(value: i64) -> Self {
        PriceValue::Integer(value)
    }
}

impl From<&str> for PriceValue {
    fn from(value: &str) -> Self {
        PriceValue::Text(value.to_string())
    }
}

fn parse_leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}

// =============================================================================
// Restaurant
// =============================================================================

/// A restaurant record.
///
/// Only the fields the engine reads are typed; everything else in the
/// source document lands in `extra` and is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cuisine_type: String,
    #[serde(default)]
    pub price_level: Option<PriceValue>,
    /// Static aggregate rating shown to users (0.0 - 5.0)
    #[serde(default)]
    pub rating: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Restaurant {
    /// Convenience constructor used by tests and tools
    pub fn new(
        id: impl Into<RestaurantId>,
        cuisine_type: impl Into<String>,
        price_level: i64,
        rating: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            cuisine_type: cuisine_type.into(),
            price_level: Some(PriceValue::Integer(price_level)),
            rating,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// A single stored review, as seen by the training pipeline.
///
/// Rust concept: `Option<T>` models fields that older documents may lack.
/// A review without a rating is skipped by the rating transform; a review
/// without a timestamp is not decayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEvent {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    /// Star rating from 1.0 to 5.0
    #[serde(default, rename = "rating")]
    pub raw_rating: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub helpful_votes: u32,
}

impl RatingEvent {
    pub fn new(
        user_id: impl Into<UserId>,
        restaurant_id: impl Into<RestaurantId>,
        raw_rating: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            restaurant_id: restaurant_id.into(),
            raw_rating: Some(raw_rating),
            created_at: None,
            helpful_votes: 0,
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_helpful_votes(mut self, votes: u32) -> Self {
        self.helpful_votes = votes;
        self
    }
}

// =============================================================================
// Preferences and interactions
// =============================================================================

/// Explicit preferences a user picked during onboarding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub price_range: Option<PriceValue>,
    #[serde(default)]
    pub cuisines: HashSet<String>,
    /// Stored alongside the other preferences but not used for scoring
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
}

impl UserPreferences {
    pub fn new<I, S>(cuisines: I, price_range: impl Into<PriceValue>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            price_range: Some(price_range.into()),
            cuisines: cuisines.into_iter().map(Into::into).collect(),
            dietary_restrictions: Vec::new(),
        }
    }
}

/// Preferences document as stored, keyed by the owning user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRecord {
    pub user_id: UserId,
    #[serde(flatten)]
    pub preferences: UserPreferences,
}

/// A favourite or dislike. Both collections share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
}

/// Which interaction collection a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Favourite,
    Dislike,
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Review statistics for a restaurant, computed once at load time
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RestaurantStats {
    pub avg_review_rating: f64,
    pub review_count: u32,
}

// =============================================================================
// DataIndex - The In-Memory Snapshot
// =============================================================================

/// Holds every record the engine consumes, with indices for per-user lookups.
///
/// Restaurants are kept in a `Vec` so that candidate enumeration order is
/// the load order; `restaurant_positions` gives O(1) lookups by id.
#[derive(Debug, Default)]
pub struct DataIndex {
    // Primary data stores
    pub(crate) restaurants: Vec<Restaurant>,
    pub(crate) restaurant_positions: HashMap<RestaurantId, usize>,
    pub(crate) rating_events: Vec<RatingEvent>,
    pub(crate) preferences: HashMap<UserId, UserPreferences>,

    // Per-user indices
    /// Positions in `rating_events` of every review written by each user
    pub(crate) user_reviews: HashMap<UserId, Vec<usize>>,
    pub(crate) favourites: HashMap<UserId, HashSet<RestaurantId>>,
    pub(crate) dislikes: HashMap<UserId, HashSet<RestaurantId>>,

    // Secondary indices
    pub(crate) cuisine_index: HashMap<String, Vec<RestaurantId>>,
    pub(crate) restaurant_stats: HashMap<RestaurantId, RestaurantStats>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_restaurant(&self, id: &str) -> Option<&Restaurant> {
        self.restaurant_positions
            .get(id)
            .map(|&position| &self.restaurants[position])
    }

    /// All restaurants, in load order
    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    /// Every stored review, in load order
    pub fn rating_events(&self) -> &[RatingEvent] {
        &self.rating_events
    }

    /// All reviews written by a user (empty if none)
    pub fn get_user_reviews(&self, user_id: &str) -> Vec<&RatingEvent> {
        self.user_reviews
            .get(user_id)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| &self.rating_events[position])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn review_count(&self, user_id: &str) -> usize {
        self.user_reviews.get(user_id).map_or(0, Vec::len)
    }

    pub fn get_preferences(&self, user_id: &str) -> Option<&UserPreferences> {
        self.preferences.get(user_id)
    }

    pub fn get_favourites(&self, user_id: &str) -> Option<&HashSet<RestaurantId>> {
        self.favourites.get(user_id)
    }

    pub fn get_dislikes(&self, user_id: &str) -> Option<&HashSet<RestaurantId>> {
        self.dislikes.get(user_id)
    }

    /// Restaurants the user favourited or disliked.
    ///
    /// These never show up in the user's recommendations.
    pub fn excluded_restaurants(&self, user_id: &str) -> HashSet<RestaurantId> {
        self.favourites
            .get(user_id)
            .into_iter()
            .chain(self.dislikes.get(user_id))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn get_restaurants_by_cuisine(&self, cuisine: &str) -> &[RestaurantId] {
        self.cuisine_index
            .get(cuisine)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_restaurant_stats(&self, id: &str) -> Option<&RestaurantStats> {
        self.restaurant_stats.get(id)
    }

    /// Every user that appears in reviews, preferences or interactions, sorted
    pub fn known_user_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .user_reviews
            .keys()
            .chain(self.preferences.keys())
            .chain(self.favourites.keys())
            .chain(self.dislikes.keys())
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Case-insensitive substring search over restaurant names
    pub fn search_by_name(&self, query: &str) -> Vec<&Restaurant> {
        let needle = query.to_lowercase();
        self.restaurants
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    // Mutators - used during loading and by tests

    /// Insert a restaurant, replacing any record with the same id in place
    pub fn insert_restaurant(&mut self, restaurant: Restaurant) {
        match self.restaurant_positions.get(&restaurant.id) {
            Some(&position) => self.restaurants[position] = restaurant,
            None => {
                self.restaurant_positions
                    .insert(restaurant.id.clone(), self.restaurants.len());
                self.restaurants.push(restaurant);
            }
        }
    }

    /// Insert a review and update the per-user index
    pub fn insert_rating_event(&mut self, event: RatingEvent) {
        self.user_reviews
            .entry(event.user_id.clone())
            .or_default()
            .push(self.rating_events.len());
        self.rating_events.push(event);
    }

    pub fn insert_preferences(&mut self, user_id: impl Into<UserId>, prefs: UserPreferences) {
        self.preferences.insert(user_id.into(), prefs);
    }

    pub fn insert_interaction(&mut self, kind: InteractionKind, record: InteractionRecord) {
        let target = match kind {
            InteractionKind::Favourite => &mut self.favourites,
            InteractionKind::Dislike => &mut self.dislikes,
        };
        target
            .entry(record.user_id)
            .or_default()
            .insert(record.restaurant_id);
    }

    /// Get counts for debugging/validation: (restaurants, reviews, users with preferences)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.restaurants.len(),
            self.rating_events.len(),
            self.preferences.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_value_coercion() {
        assert_eq!(PriceValue::Integer(2).as_level(), Some(2));
        assert_eq!(PriceValue::Float(3.0).as_level(), Some(3));
        assert_eq!(PriceValue::Float(2.9).as_level(), Some(2));
        assert_eq!(PriceValue::Float(f64::NAN).as_level(), None);
        assert_eq!(PriceValue::from("2").as_level(), Some(2));
        assert_eq!(PriceValue::from(" 3 ").as_level(), Some(3));
        assert_eq!(PriceValue::from("2.7").as_level(), Some(2));
        assert_eq!(PriceValue::from("-1").as_level(), Some(-1));
        assert_eq!(PriceValue::from("$$").as_level(), None);
        assert_eq!(PriceValue::from("").as_level(), None);
    }

    #[test]
    fn test_price_value_deserializes_numbers_and_strings() {
        let values: Vec<PriceValue> = serde_json::from_str(r#"[2, 2.5, "4"]"#).unwrap();
        assert_eq!(values[0], PriceValue::Integer(2));
        assert_eq!(values[1], PriceValue::Float(2.5));
        assert_eq!(values[2], PriceValue::Text("4".to_string()));
    }

    #[test]
    fn test_restaurant_passes_unknown_fields_through() {
        let json = r#"{
            "id": "r1",
            "name": "Trattoria",
            "cuisineType": "Italian",
            "priceLevel": 2,
            "rating": 4.4,
            "address": "1 Main St",
            "photos": ["a.jpg"]
        }"#;
        let restaurant: Restaurant = serde_json::from_str(json).unwrap();
        assert_eq!(restaurant.cuisine_type, "Italian");
        assert_eq!(restaurant.extra.get("address").unwrap(), "1 Main St");

        let round_trip = serde_json::to_value(&restaurant).unwrap();
        assert_eq!(round_trip["photos"][0], "a.jpg");
    }

    #[test]
    fn test_rating_event_optional_fields() {
        let json = r#"{"userId": "u1", "restaurantId": "r1"}"#;
        let event: RatingEvent = serde_json::from_str(json).unwrap();
        assert!(event.raw_rating.is_none());
        assert!(event.created_at.is_none());
        assert_eq!(event.helpful_votes, 0);
    }

    #[test]
    fn test_insert_restaurant_replaces_in_place() {
        let mut index = DataIndex::new();
        index.insert_restaurant(Restaurant::new("1", "Italian", 2, 4.0));
        index.insert_restaurant(Restaurant::new("2", "Thai", 1, 4.2));
        index.insert_restaurant(Restaurant::new("1", "Italian", 3, 4.1));

        let ids: Vec<&str> = index.restaurants().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(index.get_restaurant("1").unwrap().rating, 4.1);
    }

    #[test]
    fn test_excluded_restaurants_union() {
        let mut index = DataIndex::new();
        index.insert_interaction(
            InteractionKind::Favourite,
            InteractionRecord { user_id: "u1".into(), restaurant_id: "a".into() },
        );
        index.insert_interaction(
            InteractionKind::Dislike,
            InteractionRecord { user_id: "u1".into(), restaurant_id: "b".into() },
        );
        index.insert_interaction(
            InteractionKind::Dislike,
            InteractionRecord { user_id: "u2".into(), restaurant_id: "c".into() },
        );

        let excluded = index.excluded_restaurants("u1");
        assert_eq!(excluded.len(), 2);
        assert!(excluded.contains("a") && excluded.contains("b"));
        assert!(index.excluded_restaurants("nobody").is_empty());
    }
}
