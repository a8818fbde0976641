//! Short-lived cache of ranked lists, keyed by user and filter.
//!
//! Each entry remembers the model generation it was ranked with. A lookup
//! under a newer generation is a miss, so a list ranked on a model that was
//! swapped out mid-request is never served.

use data_loader::UserId;
use moka::sync::Cache;
use pipeline::{FilterMode, RankedRecommendation};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub type CachedList = Arc<Vec<RankedRecommendation>>;

/// Longest TTL the cache accepts; larger values are capped
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    generation: u64,
    recommendations: CachedList,
}

/// Counts over the live (unexpired) cache contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    /// Entries ranked with the current model
    pub valid: usize,
    /// Entries ranked with an older model, dropped on next lookup
    pub stale: usize,
    /// Recommendations held by valid entries only
    pub total_recommendations: usize,
}

#[derive(Debug)]
pub struct RecommendationCache {
    entries: Cache<(UserId, FilterMode), CacheEntry>,
    ttl: Duration,
}

impl RecommendationCache {
    pub fn new(ttl: Duration) -> Self {
        let ttl = ttl.min(MAX_TTL);
        Self {
            entries: Cache::builder().time_to_live(ttl).build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached list, if present, unexpired and ranked with `generation`
    pub fn get(&self, user_id: &str, filter: FilterMode, generation: u64) -> Option<CachedList> {
        let key = (user_id.to_string(), filter);
        let entry = self.entries.get(&key)?;
        if entry.generation != generation {
            debug!(user_id, %filter, cached = entry.generation, generation, "Dropping stale cache entry");
            self.entries.invalidate(&key);
            return None;
        }
        debug!(user_id, %filter, "Cache hit");
        Some(entry.recommendations)
    }

    pub fn insert(&self, user_id: &str, filter: FilterMode, generation: u64, recommendations: CachedList) {
        let entry = CacheEntry {
            generation,
            recommendations,
        };
        self.entries.insert((user_id.to_string(), filter), entry);
    }

    /// Drop every filter's entry for one user
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        let keys: Vec<Arc<(UserId, FilterMode)>> = self
            .entries
            .iter()
            .filter(|(key, _)| key.0 == user_id)
            .map(|(key, _)| key)
            .collect();
        for key in &keys {
            self.entries.invalidate(key.as_ref());
        }
        keys.len()
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn stats(&self, generation: u64) -> CacheStats {
        let mut stats = CacheStats::default();
        for (_, entry) in self.entries.iter() {
            stats.entries += 1;
            if entry.generation == generation {
                stats.valid += 1;
                stats.total_recommendations += entry.recommendations.len();
            } else {
                stats.stale += 1;
            }
        }
        stats
    }
}
