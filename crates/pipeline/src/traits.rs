//! The seam between ranking and the filters applied to its output.

use crate::recommendation::RankedRecommendation;

/// A post-ranking filter.
///
/// Implementations may drop entries but must keep the relative order of
/// the ones they keep. `Send + Sync` so one pipeline can serve concurrent
/// requests.
pub trait Filter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn apply(&self, ranked: Vec<RankedRecommendation>) -> Vec<RankedRecommendation>;
}
