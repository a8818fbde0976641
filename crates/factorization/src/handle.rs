//! Process-wide holder for the current model.
//!
//! Readers take an `Arc` snapshot and keep using it for the whole request,
//! so a retrain running at the same time never shows them a half-built
//! model. Retrains are serialized; the read-write lock is only held for the
//! pointer clone or swap, never while training.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::model::LatentFactorModel;
use crate::transform::TrainingSignal;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct ModelHandle {
    current: RwLock<Option<Arc<LatentFactorModel>>>,
    retrain_lock: Mutex<()>,
    generation: AtomicU64,
}

impl ModelHandle {
    /// A handle with no model yet; rankings report unavailable until a retrain
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: LatentFactorModel) -> Self {
        let handle = Self::new();
        handle.install(Some(model));
        handle
    }

    /// The model current at the time of the call, if any
    pub fn snapshot(&self) -> Option<Arc<LatentFactorModel>> {
        self.current.read().clone()
    }

    pub fn is_available(&self) -> bool {
        self.current.read().is_some()
    }

    /// Number of swaps performed so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the current model. `None` marks the model unavailable.
    pub fn install(&self, model: Option<LatentFactorModel>) -> Option<Arc<LatentFactorModel>> {
        let model = model.map(Arc::new);
        *self.current.write() = model.clone();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        match &model {
            Some(m) => info!(generation, users = m.n_users(), "Installed new recommendation model"),
            None => warn!(generation, "Recommendation model is now unavailable"),
        }
        model
    }

    /// Train a fresh model on a full signal snapshot and swap it in.
    ///
    /// An empty snapshot installs "unavailable" rather than keeping the
    /// previous model. A config error leaves the current model untouched.
    pub fn retrain(
        &self,
        signals: &[TrainingSignal],
        config: &ModelConfig,
    ) -> Result<Option<Arc<LatentFactorModel>>> {
        let _writer = self.retrain_lock.lock();
        let model = LatentFactorModel::train(signals, config)?;
        Ok(self.install(model))
    }
}
