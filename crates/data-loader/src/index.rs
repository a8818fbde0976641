//! DataIndex building and indexing logic.
//!
//! Builds the DataIndex from a snapshot directory:
//! - Primary stores (restaurants, reviews, preferences)
//! - Per-user indices (reviews, favourites, dislikes)
//! - Secondary indices (cuisine) and per-restaurant review statistics

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

impl DataIndex {
    /// Load a full snapshot from a directory
    ///
    /// Steps:
    /// 1. Parse all five collections in parallel
    /// 2. Build primary stores and per-user indices
    /// 3. Build the cuisine index
    /// 4. Compute restaurant review statistics
    /// 5. Validate
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading restaurant snapshot from {:?}", data_dir);

        let restaurants_path = data_dir.join(parser::RESTAURANTS_FILE);
        let reviews_path = data_dir.join(parser::REVIEWS_FILE);
        let preferences_path = data_dir.join(parser::PREFERENCES_FILE);
        let favourites_path = data_dir.join(parser::FAVOURITES_FILE);
        let dislikes_path = data_dir.join(parser::DISLIKES_FILE);

        // Nested joins: restaurants + reviews on one side, the small per-user
        // collections on the other
        let ((restaurants, reviews), (preferences, (favourites, dislikes))) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_restaurants(&restaurants_path),
                    || parser::parse_reviews(&reviews_path),
                )
            },
            || {
                rayon::join(
                    || parser::parse_preferences(&preferences_path),
                    || {
                        rayon::join(
                            || parser::parse_interactions(&favourites_path),
                            || parser::parse_interactions(&dislikes_path),
                        )
                    },
                )
            },
        );

        let restaurants = restaurants?;
        let reviews = reviews?;
        let preferences = preferences?;
        let favourites = favourites?;
        let dislikes = dislikes?;

        info!(
            "Parsed {} restaurants, {} reviews, {} preference records, {} favourites, {} dislikes",
            restaurants.len(),
            reviews.len(),
            preferences.len(),
            favourites.len(),
            dislikes.len()
        );

        // Duplicate ids are checked before insertion collapses them
        check_unique_ids(&restaurants)?;

        let mut index = DataIndex::new();
        for restaurant in restaurants {
            index.insert_restaurant(restaurant);
        }
        for review in reviews {
            index.insert_rating_event(review);
        }
        for record in preferences {
            index.insert_preferences(record.user_id, record.preferences);
        }
        for record in favourites {
            index.insert_interaction(InteractionKind::Favourite, record);
        }
        for record in dislikes {
            index.insert_interaction(InteractionKind::Dislike, record);
        }

        index.build_secondary_indices();
        index.compute_restaurant_stats();
        index.validate()?;

        info!("DataIndex built and validated");
        Ok(index)
    }

    /// Build the cuisine index after restaurants are loaded
    pub fn build_secondary_indices(&mut self) {
        self.cuisine_index.clear();
        for restaurant in &self.restaurants {
            if restaurant.cuisine_type.is_empty() {
                continue;
            }
            self.cuisine_index
                .entry(restaurant.cuisine_type.clone())
                .or_default()
                .push(restaurant.id.clone());
        }
    }

    /// Compute average review rating and review count per restaurant
    ///
    /// Reviews without a rating still count towards `review_count`.
    pub fn compute_restaurant_stats(&mut self) {
        let mut grouped: HashMap<&str, Vec<Option<f64>>> = HashMap::new();
        for event in &self.rating_events {
            grouped
                .entry(event.restaurant_id.as_str())
                .or_default()
                .push(event.raw_rating);
        }

        self.restaurant_stats = grouped
            .par_iter()
            .map(|(&restaurant_id, ratings)| {
                let rated: Vec<f64> = ratings.iter().flatten().copied().collect();
                let avg_review_rating = if rated.is_empty() {
                    0.0
                } else {
                    rated.iter().sum::<f64>() / rated.len() as f64
                };
                (
                    restaurant_id.to_string(),
                    RestaurantStats {
                        avg_review_rating,
                        review_count: ratings.len() as u32,
                    },
                )
            })
            .collect();
    }

    /// Validate data integrity
    ///
    /// Restaurant ids must be non-empty; reviews and interactions must name
    /// both a user and a restaurant. Reviews of restaurants missing from the
    /// snapshot are allowed: the model still learns from them.
    pub fn validate(&self) -> Result<()> {
        if let Some(restaurant) = self.restaurants.iter().find(|r| r.id.trim().is_empty()) {
            return Err(DataLoadError::InvalidValue {
                field: "restaurant.id".to_string(),
                value: format!("{:?} ({})", restaurant.id, restaurant.name),
            });
        }

        for event in &self.rating_events {
            if event.user_id.is_empty() || event.restaurant_id.is_empty() {
                return Err(DataLoadError::ValidationError(format!(
                    "review with empty id: user={:?} restaurant={:?}",
                    event.user_id, event.restaurant_id
                )));
            }
        }

        let interactions = self.favourites.iter().chain(self.dislikes.iter());
        for (user_id, restaurant_ids) in interactions {
            if user_id.is_empty() || restaurant_ids.iter().any(String::is_empty) {
                return Err(DataLoadError::ValidationError(format!(
                    "interaction with empty id for user {:?}",
                    user_id
                )));
            }
        }
        Ok(())
    }
}

fn check_unique_ids(restaurants: &[Restaurant]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for restaurant in restaurants {
        if !seen.insert(restaurant.id.as_str()) {
            return Err(DataLoadError::ValidationError(format!(
                "duplicate restaurant id {}",
                restaurant.id
            )));
        }
    }
    Ok(())
}
