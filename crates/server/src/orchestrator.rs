//! # Recommendation Orchestrator
//!
//! Owns everything a recommendation request needs and coordinates it:
//! 1. Check the (user, filter) cache against the current model generation
//! 2. Gather preferences, the exclusion set and the review count
//! 3. Take a snapshot of the current model
//! 4. Rank on the blocking pool
//! 5. Cache and return the full ranked list
//!
//! Retraining transforms every stored review, trains a fresh model on the
//! blocking pool, swaps it into the shared handle and clears the cache.
//! Requests already running keep the model they started with, but their
//! lists are not cached once a newer model is installed.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use data_loader::DataIndex;
use factorization::{LatentFactorModel, ModelHandle, RatingPredictor, transform_ratings};
use pipeline::{FilterMode, HybridRanker, RankingError, RankingRequest};

use crate::cache::{CacheStats, CachedList, RecommendationCache};
use crate::config::EngineConfig;

/// What a retrain did
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingSummary {
    /// Stored reviews fed to the transform
    pub events: usize,
    /// Reviews that produced a training signal
    pub signals: usize,
    pub users: usize,
    pub items: usize,
    /// Training RMSE after the last epoch
    pub final_rmse: Option<f64>,
    /// False when there was nothing to train on
    pub available: bool,
}

impl TrainingSummary {
    fn new(events: usize, signals: usize, model: Option<&LatentFactorModel>) -> Self {
        Self {
            events,
            signals,
            users: model.map_or(0, LatentFactorModel::n_users),
            items: model.map_or(0, LatentFactorModel::n_items),
            final_rmse: model.and_then(|m| m.epoch_rmse().last().copied()),
            available: model.is_some(),
        }
    }
}

/// Main orchestrator; cheap to clone, clones share model and cache
#[derive(Debug, Clone)]
pub struct RecommendationOrchestrator {
    data_index: Arc<DataIndex>,
    config: EngineConfig,
    ranker: Arc<HybridRanker>,
    model: Arc<ModelHandle>,
    cache: Arc<RecommendationCache>,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator with no model yet.
    ///
    /// Requests fail with [`RankingError::ModelUnavailable`] until
    /// [`retrain`](Self::retrain) installs one.
    pub fn new(data_index: Arc<DataIndex>, config: EngineConfig) -> Result<Self> {
        config.validate().context("Invalid engine configuration")?;

        Ok(Self {
            data_index,
            ranker: Arc::new(HybridRanker::new(config.ranker)),
            model: Arc::new(ModelHandle::new()),
            cache: Arc::new(RecommendationCache::new(config.cache_ttl())),
            config,
        })
    }

    /// Create an orchestrator and train the first model from the stored reviews
    pub async fn bootstrap(data_index: Arc<DataIndex>, config: EngineConfig) -> Result<Self> {
        let orchestrator = Self::new(data_index, config)?;
        let summary = orchestrator.retrain(Utc::now()).await?;
        if !summary.available {
            warn!("Started without a model; no reviews to train on");
        }
        Ok(orchestrator)
    }

    /// Rebuild the model from every stored review, aged relative to `now`.
    #[instrument(skip(self))]
    pub async fn retrain(&self, now: DateTime<Utc>) -> Result<TrainingSummary> {
        let start_time = Instant::now();

        let data_index = Arc::clone(&self.data_index);
        let handle = Arc::clone(&self.model);
        let config = self.config;

        let summary = tokio::task::spawn_blocking(move || -> Result<TrainingSummary> {
            let events = data_index.rating_events();
            let signals = transform_ratings(events, now, &config.transform);
            let model = handle
                .retrain(&signals, &config.model)
                .context("Failed to train recommendation model")?;
            Ok(TrainingSummary::new(events.len(), signals.len(), model.as_deref()))
        })
        .await
        .context("Training task panicked")??;

        self.cache.clear();

        info!(
            "Retrained on {} signals from {} reviews: {} users, {} restaurants, final RMSE {:?} in {:.2?}",
            summary.signals,
            summary.events,
            summary.users,
            summary.items,
            summary.final_rmse,
            start_time.elapsed()
        );
        Ok(summary)
    }

    /// Main entry point: the full ranked list for a user.
    ///
    /// Fails with an error carrying [`RankingError::ModelUnavailable`] when no
    /// model is installed. Callers can detect it with
    /// `err.downcast_ref::<RankingError>()`.
    #[instrument(skip(self))]
    pub async fn get_recommendations(&self, user_id: &str, filter: FilterMode) -> Result<CachedList> {
        let start_time = Instant::now();

        // Read before the snapshot: install swaps the model, then bumps the generation
        let generation = self.model.generation();
        if let Some(cached) = self.cache.get(user_id, filter, generation) {
            return Ok(cached);
        }

        let snapshot = self.model.snapshot();
        let data_index = Arc::clone(&self.data_index);
        let ranker = Arc::clone(&self.ranker);
        let owned_user = user_id.to_string();

        let ranked = tokio::task::spawn_blocking(move || {
            let excluded = data_index.excluded_restaurants(&owned_user);
            let request = RankingRequest {
                user_id: &owned_user,
                preferences: data_index.get_preferences(&owned_user),
                restaurants: data_index.restaurants(),
                excluded: &excluded,
                review_count: data_index.review_count(&owned_user),
                filter,
            };
            let model = snapshot.as_deref().map(|m| m as &dyn RatingPredictor);
            ranker.rank(&request, model)
        })
        .await
        .context("Ranking task panicked")?;

        let ranked = match ranked {
            Ok(ranked) => Arc::new(ranked),
            Err(RankingError::ModelUnavailable) => {
                warn!("Recommendation requested while the model is unavailable");
                return Err(RankingError::ModelUnavailable.into());
            }
            Err(e) => return Err(e.into()),
        };

        if self.model.generation() == generation {
            self.cache.insert(user_id, filter, generation, Arc::clone(&ranked));
        } else {
            debug!(user_id, "Model replaced while ranking; not caching");
        }
        info!(
            "Ranked {} restaurants for user {} in {:.2?}",
            ranked.len(),
            user_id,
            start_time.elapsed()
        );
        Ok(ranked)
    }

    /// Warm the cache for every filter mode. Returns how many lists were cached.
    pub async fn preload(&self, user_id: &str) -> usize {
        let (all, highly_rated) = tokio::join!(
            self.get_recommendations(user_id, FilterMode::All),
            self.get_recommendations(user_id, FilterMode::HighlyRated)
        );

        let mut warmed = 0;
        for (filter, result) in [(FilterMode::All, all), (FilterMode::HighlyRated, highly_rated)] {
            match result {
                Ok(_) => warmed += 1,
                Err(e) => warn!("Failed to preload {} for user {}: {:#}", filter, user_id, e),
            }
        }
        warmed
    }

    /// Forget cached lists for a user whose data changed
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        self.cache.invalidate_user(user_id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(self.model.generation())
    }

    pub fn is_model_available(&self) -> bool {
        self.model.is_available()
    }

    pub fn model(&self) -> Option<Arc<LatentFactorModel>> {
        self.model.snapshot()
    }

    pub fn data_index(&self) -> &Arc<DataIndex> {
        &self.data_index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{RatingEvent, Restaurant, UserPreferences};
    use factorization::ModelConfig;

    /// Three restaurants, two established reviewers and one newcomer
    fn build_test_data_index() -> Arc<DataIndex> {
        let mut index = DataIndex::new();
        index.insert_restaurant(Restaurant::new("1", "Italian", 2, 4.0));
        index.insert_restaurant(Restaurant::new("2", "Japanese", 4, 4.9));
        index.insert_restaurant(Restaurant::new("3", "Thai", 2, 4.6));

        for (user, ratings) in [("u1", [5.0, 2.0, 4.0]), ("u2", [4.0, 5.0, 1.0])] {
            for (restaurant, rating) in ["1", "2", "3"].into_iter().zip(ratings) {
                index.insert_rating_event(RatingEvent::new(user, restaurant, rating));
            }
        }
        index.insert_preferences("newcomer", UserPreferences::new(["Thai"], "2"));
        index.build_secondary_indices();
        Arc::new(index)
    }

    fn test_config() -> EngineConfig {
        EngineConfig::default().with_model(ModelConfig::default().with_factors(4).with_seed(3))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig::default().with_model(ModelConfig::default().with_epochs(0));
        assert!(RecommendationOrchestrator::new(build_test_data_index(), config).is_err());
    }

    #[tokio::test]
    async fn test_requests_fail_before_first_training() {
        let orchestrator = RecommendationOrchestrator::new(build_test_data_index(), test_config()).unwrap();

        let err = orchestrator
            .get_recommendations("newcomer", FilterMode::All)
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<RankingError>(), Some(&RankingError::ModelUnavailable));
    }

    #[tokio::test]
    async fn test_retrain_summary() {
        let orchestrator = RecommendationOrchestrator::new(build_test_data_index(), test_config()).unwrap();
        let summary = orchestrator.retrain(Utc::now()).await.unwrap();

        assert_eq!(summary.events, 6);
        assert_eq!(summary.signals, 6);
        assert_eq!(summary.users, 2);
        assert_eq!(summary.items, 3);
        assert!(summary.available);
        assert!(summary.final_rmse.is_some());
        assert!(orchestrator.is_model_available());
    }

    #[tokio::test]
    async fn test_cold_start_request_after_training() {
        let orchestrator = RecommendationOrchestrator::bootstrap(build_test_data_index(), test_config())
            .await
            .unwrap();

        let ranked = orchestrator
            .get_recommendations("newcomer", FilterMode::All)
            .await
            .unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn test_retrain_clears_cache() {
        let orchestrator = RecommendationOrchestrator::bootstrap(build_test_data_index(), test_config())
            .await
            .unwrap();

        assert_eq!(orchestrator.preload("u1").await, 2);
        assert_eq!(orchestrator.cache_stats().valid, 2);

        orchestrator.retrain(Utc::now()).await.unwrap();
        assert_eq!(orchestrator.cache_stats().entries, 0);
    }
}
