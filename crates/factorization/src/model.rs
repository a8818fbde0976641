//! Biased matrix factorization trained by stochastic gradient descent.
//!
//! ## Model
//! The weight for (user u, restaurant i) is estimated as
//!
//! ```text
//! r̂(u, i) = μ + b_u + b_i + p_u · q_i
//! ```
//!
//! where μ is the global mean weight, `b_u`/`b_i` are biases and `p_u`/`q_i`
//! are latent factor vectors of length `rank`.
//!
//! ## Training
//! Every epoch walks all signals in input order and, for each one, moves the
//! parameters against the gradient of the squared error plus an L2 penalty:
//!
//! ```text
//! e    = r - r̂(u, i)
//! b_u += lr * (e - reg * b_u)
//! b_i += lr * (e - reg * b_i)
//! p_u += lr * (e * q_i - reg * p_u)
//! q_i += lr * (e * p_u - reg * q_i)
//! ```
//!
//! With only one user or one restaurant the factor terms carry no
//! information, so the model is fitted with biases only (rank 0).
//!
//! ## Unseen ids
//! Prediction never fails: unknown users or restaurants contribute no bias
//! and no factor term, so a fully unknown pair is estimated at μ.
//! Predictions are not clamped to the rating scale.

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::transform::TrainingSignal;
use data_loader::{RestaurantId, UserId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// A trained biased factorization over users × restaurants.
///
/// Immutable once trained; a retrain builds a new instance.
#[derive(Debug, Clone)]
pub struct LatentFactorModel {
    config: ModelConfig,
    /// Length of each factor vector; 0 means bias-only
    rank: usize,
    global_mean: f64,

    // Raw id <-> internal index mappings
    user_ids: Vec<UserId>,
    item_ids: Vec<RestaurantId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<RestaurantId, usize>,

    user_bias: Vec<f64>,
    item_bias: Vec<f64>,
    /// Row-major `n_users × rank`
    user_factors: Vec<f64>,
    /// Row-major `n_items × rank`
    item_factors: Vec<f64>,

    /// Internal item indices each user contributed signals for
    user_items: Vec<Vec<usize>>,
    epoch_rmse: Vec<f64>,
    n_signals: usize,
}

/// A signal with ids already resolved to internal indices
#[derive(Debug, Clone, Copy)]
struct IndexedSignal {
    user: usize,
    item: usize,
    weight: f64,
}

impl LatentFactorModel {
    /// Train a model from scratch on the full signal corpus.
    ///
    /// Returns `Ok(None)` when `signals` is empty: there is nothing to learn
    /// from and callers must report the model as unavailable.
    pub fn train(signals: &[TrainingSignal], config: &ModelConfig) -> Result<Option<Self>> {
        config.validate()?;

        if signals.is_empty() {
            warn!("No training signals; the recommendation model cannot be trained");
            return Ok(None);
        }

        let mut model = Self::empty(*config);
        let indexed = model.index_signals(signals);
        model.global_mean = indexed.iter().map(|s| s.weight).sum::<f64>() / indexed.len() as f64;

        model.rank = if model.user_ids.len() < 2 || model.item_ids.len() < 2 {
            debug!(
                "Corpus has {} users and {} restaurants; fitting biases only",
                model.user_ids.len(),
                model.item_ids.len()
            );
            0
        } else {
            config.n_factors
        };

        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        model.initialize_parameters(&mut rng)?;
        model.fit(&indexed);

        info!(
            users = model.user_ids.len(),
            restaurants = model.item_ids.len(),
            signals = model.n_signals,
            rank = model.rank,
            final_rmse = model.epoch_rmse.last().copied().unwrap_or(f64::NAN),
            "Recommendation model trained"
        );
        Ok(Some(model))
    }

    fn empty(config: ModelConfig) -> Self {
        Self {
            config,
            rank: 0,
            global_mean: 0.0,
            user_ids: Vec::new(),
            item_ids: Vec::new(),
            user_index: HashMap::new(),
            item_index: HashMap::new(),
            user_bias: Vec::new(),
            item_bias: Vec::new(),
            user_factors: Vec::new(),
            item_factors: Vec::new(),
            user_items: Vec::new(),
            epoch_rmse: Vec::new(),
            n_signals: 0,
        }
    }

    /// Assign internal indices in first-seen order and resolve every signal
    fn index_signals(&mut self, signals: &[TrainingSignal]) -> Vec<IndexedSignal> {
        let mut indexed = Vec::with_capacity(signals.len());
        for signal in signals {
            let user = match self.user_index.get(&signal.user_id) {
                Some(&idx) => idx,
                None => {
                    let idx = self.user_ids.len();
                    self.user_ids.push(signal.user_id.clone());
                    self.user_index.insert(signal.user_id.clone(), idx);
                    self.user_items.push(Vec::new());
                    idx
                }
            };
            let item = match self.item_index.get(&signal.restaurant_id) {
                Some(&idx) => idx,
                None => {
                    let idx = self.item_ids.len();
                    self.item_ids.push(signal.restaurant_id.clone());
                    self.item_index.insert(signal.restaurant_id.clone(), idx);
                    idx
                }
            };
            self.user_items[user].push(item);
            indexed.push(IndexedSignal {
                user,
                item,
                weight: signal.weight,
            });
        }
        self.n_signals = indexed.len();
        indexed
    }

    fn initialize_parameters(&mut self, rng: &mut StdRng) -> Result<()> {
        let (n_users, n_items, k) = (self.user_ids.len(), self.item_ids.len(), self.rank);
        let normal = Normal::new(0.0, self.config.init_std)
            .map_err(|e| ModelError::InvalidConfig(format!("init_std: {e}")))?;

        self.user_bias = vec![0.0; n_users];
        self.item_bias = vec![0.0; n_items];
        self.user_factors = (0..n_users * k).map(|_| rng.sample(normal)).collect();
        self.item_factors = (0..n_items * k).map(|_| rng.sample(normal)).collect();
        Ok(())
    }

    fn fit(&mut self, signals: &[IndexedSignal]) {
        let lr = self.config.learning_rate;
        let reg = self.config.regularization;
        let k = self.rank;

        for epoch in 0..self.config.n_epochs {
            for signal in signals {
                let (u, i) = (signal.user, signal.item);
                let err = signal.weight - self.estimate(u, i);

                let bu = self.user_bias[u];
                let bi = self.item_bias[i];
                self.user_bias[u] += lr * (err - reg * bu);
                self.item_bias[i] += lr * (err - reg * bi);

                let pu = &mut self.user_factors[u * k..(u + 1) * k];
                let qi = &mut self.item_factors[i * k..(i + 1) * k];
                for (p, q) in pu.iter_mut().zip(qi.iter_mut()) {
                    let (p_old, q_old) = (*p, *q);
                    *p += lr * (err * q_old - reg * p_old);
                    *q += lr * (err * p_old - reg * q_old);
                }
            }

            let rmse = self.indexed_rmse(signals);
            debug!("SGD epoch {}: training rmse = {:.4}", epoch + 1, rmse);
            self.epoch_rmse.push(rmse);
        }
    }

    /// Full estimate for a pair of known internal indices
    fn estimate(&self, u: usize, i: usize) -> f64 {
        self.global_mean + self.user_bias[u] + self.item_bias[i] + self.factor_dot(u, i)
    }

    fn factor_dot(&self, u: usize, i: usize) -> f64 {
        let k = self.rank;
        let pu = &self.user_factors[u * k..(u + 1) * k];
        let qi = &self.item_factors[i * k..(i + 1) * k];
        pu.iter().zip(qi).map(|(p, q)| p * q).sum()
    }

    fn indexed_rmse(&self, signals: &[IndexedSignal]) -> f64 {
        let sum_sq: f64 = signals
            .iter()
            .map(|s| {
                let err = s.weight - self.estimate(s.user, s.item);
                err * err
            })
            .sum();
        (sum_sq / signals.len() as f64).sqrt()
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Estimated weight for any (user, restaurant) pair.
    ///
    /// Falls back to the global mean plus whichever bias terms are known;
    /// the factor term is only added when both ids were seen in training.
    pub fn predict(&self, user_id: &str, restaurant_id: &str) -> f64 {
        let user = self.user_index.get(user_id).copied();
        let item = self.item_index.get(restaurant_id).copied();

        let mut estimate = self.global_mean;
        if let Some(u) = user {
            estimate += self.user_bias[u];
        }
        if let Some(i) = item {
            estimate += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (user, item) {
            estimate += self.factor_dot(u, i);
        }
        estimate
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.user_index.contains_key(user_id)
    }

    pub fn has_item(&self, restaurant_id: &str) -> bool {
        self.item_index.contains_key(restaurant_id)
    }

    /// Internal index of a raw user id. Fails on ids unseen in training.
    pub fn inner_user_index(&self, user_id: &str) -> Result<usize> {
        self.user_index
            .get(user_id)
            .copied()
            .ok_or_else(|| ModelError::UnknownUser(user_id.to_string()))
    }

    /// Internal index of a raw restaurant id. Fails on ids unseen in training.
    pub fn inner_item_index(&self, restaurant_id: &str) -> Result<usize> {
        self.item_index
            .get(restaurant_id)
            .copied()
            .ok_or_else(|| ModelError::UnknownItem(restaurant_id.to_string()))
    }

    pub fn raw_user_id(&self, inner: usize) -> Option<&str> {
        self.user_ids.get(inner).map(String::as_str)
    }

    pub fn raw_item_id(&self, inner: usize) -> Option<&str> {
        self.item_ids.get(inner).map(String::as_str)
    }

    /// Restaurants the user contributed training signals for, without duplicates
    pub fn items_rated_by(&self, user_id: &str) -> Vec<&str> {
        let Ok(u) = self.inner_user_index(user_id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.user_items[u]
            .iter()
            .filter(|&&i| seen.insert(i))
            .map(|&i| self.item_ids[i].as_str())
            .collect()
    }

    /// Top-N known restaurants the user has not rated, by estimated weight.
    ///
    /// Ties keep training index order. Unknown users get estimates from the
    /// item biases alone.
    pub fn recommend_top_n(&self, user_id: &str, n: usize) -> Vec<(RestaurantId, f64)> {
        let rated: HashSet<&str> = self.items_rated_by(user_id).into_iter().collect();

        let mut predictions: Vec<(RestaurantId, f64)> = self
            .item_ids
            .par_iter()
            .filter(|item| !rated.contains(item.as_str()))
            .map(|item| (item.clone(), self.predict(user_id, item)))
            .collect();

        predictions.sort_by(|a, b| b.1.total_cmp(&a.1));
        predictions.truncate(n);
        predictions
    }

    /// Root mean squared error of the model on any signal set.
    ///
    /// `None` for an empty set. Useful for held-out checks.
    pub fn rmse(&self, signals: &[TrainingSignal]) -> Option<f64> {
        if signals.is_empty() {
            return None;
        }
        let sum_sq: f64 = signals
            .par_iter()
            .map(|s| {
                let err = s.weight - self.predict(&s.user_id, &s.restaurant_id);
                err * err
            })
            .sum();
        Some((sum_sq / signals.len() as f64).sqrt())
    }

    // Accessors

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    pub fn n_signals(&self) -> usize {
        self.n_signals
    }

    /// Training RMSE after each epoch
    pub fn epoch_rmse(&self) -> &[f64] {
        &self.epoch_rmse
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 20 users × 12 restaurants with strong user and restaurant effects
    fn structured_signals() -> Vec<TrainingSignal> {
        let mut signals = Vec::new();
        for u in 0..20 {
            let user_effect = [-1.0, 0.0, 1.0][u % 3];
            for i in 0..12 {
                let item_effect = (i as f64 - 5.5) / 11.0;
                let weight = (3.0 + user_effect + item_effect).clamp(1.0, 5.0);
                signals.push(TrainingSignal::new(format!("u{u}"), format!("r{i}"), weight));
            }
        }
        signals
    }

    fn test_config() -> ModelConfig {
        ModelConfig::default().with_factors(5).with_seed(7)
    }

    #[test]
    fn test_empty_corpus_is_unavailable() {
        let model = LatentFactorModel::train(&[], &ModelConfig::default()).unwrap();
        assert!(model.is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ModelConfig::default().with_epochs(0);
        let result = LatentFactorModel::train(&structured_signals(), &config);
        assert!(matches!(result, Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn test_training_error_decreases() {
        let config = test_config().with_epochs(10);
        let model = LatentFactorModel::train(&structured_signals(), &config)
            .unwrap()
            .unwrap();

        let rmse = model.epoch_rmse();
        assert_eq!(rmse.len(), 10);
        for pair in rmse.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9, "rmse went up: {:?}", rmse);
        }
        assert!(rmse[9] < rmse[0]);
    }

    #[test]
    fn test_held_out_beats_global_mean() {
        let signals = structured_signals();
        let (train, held_out): (Vec<_>, Vec<_>) = signals
            .into_iter()
            .enumerate()
            .partition(|(idx, _)| idx % 7 != 0);
        let train: Vec<TrainingSignal> = train.into_iter().map(|(_, s)| s).collect();
        let held_out: Vec<TrainingSignal> = held_out.into_iter().map(|(_, s)| s).collect();

        let config = test_config().with_epochs(40).with_learning_rate(0.01);
        let model = LatentFactorModel::train(&train, &config).unwrap().unwrap();

        let baseline = {
            let mean = model.global_mean();
            let sum_sq: f64 = held_out.iter().map(|s| (s.weight - mean).powi(2)).sum();
            (sum_sq / held_out.len() as f64).sqrt()
        };
        let model_rmse = model.rmse(&held_out).unwrap();
        assert!(model_rmse < baseline, "{model_rmse} >= {baseline}");
    }

    #[test]
    fn test_unseen_ids_fall_back_to_biases() {
        let model = LatentFactorModel::train(&structured_signals(), &test_config())
            .unwrap()
            .unwrap();

        assert_eq!(model.predict("ghost", "nowhere"), model.global_mean());

        let item_only = model.predict("ghost", "r3");
        let r3 = model.inner_item_index("r3").unwrap();
        assert!((item_only - (model.global_mean() + model.item_bias[r3])).abs() < 1e-12);

        let user_only = model.predict("u2", "nowhere");
        let u2 = model.inner_user_index("u2").unwrap();
        assert!((user_only - (model.global_mean() + model.user_bias[u2])).abs() < 1e-12);
    }

    #[test]
    fn test_index_lookups_fail_on_unseen_ids() {
        let model = LatentFactorModel::train(&structured_signals(), &test_config())
            .unwrap()
            .unwrap();

        assert_eq!(
            model.inner_user_index("ghost"),
            Err(ModelError::UnknownUser("ghost".into()))
        );
        assert!(model.inner_item_index("nowhere").is_err());

        let inner = model.inner_user_index("u4").unwrap();
        assert_eq!(model.raw_user_id(inner), Some("u4"));
        assert_eq!(model.raw_item_id(model.n_items()), None);
    }

    #[test]
    fn test_single_user_degenerates_to_biases() {
        let signals = vec![
            TrainingSignal::new("solo", "r1", 5.0),
            TrainingSignal::new("solo", "r2", 2.0),
            TrainingSignal::new("solo", "r3", 4.0),
        ];
        let model = LatentFactorModel::train(&signals, &test_config()).unwrap().unwrap();

        assert_eq!(model.rank(), 0);
        assert!(model.has_user("solo"));
        assert!(model.predict("solo", "r1") > model.predict("solo", "r2"));
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let signals = structured_signals();
        let a = LatentFactorModel::train(&signals, &test_config()).unwrap().unwrap();
        let b = LatentFactorModel::train(&signals, &test_config()).unwrap().unwrap();
        assert_eq!(a.predict("u1", "r4"), b.predict("u1", "r4"));
        assert_eq!(a.epoch_rmse(), b.epoch_rmse());
    }

    #[test]
    fn test_initial_factors_follow_configured_spread() {
        let signals: Vec<TrainingSignal> = (0..200)
            .flat_map(|u| (0..2).map(move |i| TrainingSignal::new(format!("u{u}"), format!("r{i}"), 3.0)))
            .collect();
        let config = ModelConfig::default().with_factors(50).with_seed(5);
        let mut model = LatentFactorModel::empty(config);
        model.index_signals(&signals);
        model.rank = config.n_factors;
        model.initialize_parameters(&mut StdRng::seed_from_u64(5)).unwrap();

        let n = model.user_factors.len() as f64;
        let mean = model.user_factors.iter().sum::<f64>() / n;
        let std = (model.user_factors.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert_eq!(model.user_factors.len(), 200 * 50);
        assert!(mean.abs() < 0.01);
        assert!((std - 0.1).abs() < 0.01);
    }

    #[test]
    fn test_zero_init_std_starts_from_zero_factors() {
        let config = ModelConfig {
            init_std: 0.0,
            ..test_config()
        };
        let mut model = LatentFactorModel::empty(config);
        model.index_signals(&structured_signals());
        model.rank = 4;
        model.initialize_parameters(&mut StdRng::seed_from_u64(1)).unwrap();
        assert!(model.item_factors.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_recommend_top_n_skips_rated() {
        let mut signals: Vec<TrainingSignal> = structured_signals()
            .into_iter()
            .filter(|s| !(s.user_id == "u0" && s.restaurant_id.as_str() >= "r6"))
            .collect();
        signals.push(TrainingSignal::new("u0", "r0", 1.0));

        let model = LatentFactorModel::train(&signals, &test_config()).unwrap().unwrap();
        let rated = model.items_rated_by("u0");
        assert_eq!(rated.iter().filter(|&&r| r == "r0").count(), 1);

        let recs = model.recommend_top_n("u0", 3);
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|(id, _)| !rated.contains(&id.as_str())));
        assert!(recs.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_saturated_corpus_predicts_near_top() {
        let signals = vec![
            TrainingSignal::new("a", "x", 5.0),
            TrainingSignal::new("a", "y", 5.0),
            TrainingSignal::new("b", "x", 5.0),
            TrainingSignal::new("b", "y", 5.0),
        ];
        let config = test_config().with_epochs(200).with_learning_rate(0.05).with_regularization(0.0);
        let model = LatentFactorModel::train(&signals, &config).unwrap().unwrap();

        let estimate = model.predict("a", "x");
        assert!(estimate.is_finite());
        assert!((estimate - 5.0).abs() < 0.5);
    }
}
