//! Ordered chain of post-ranking filters.

use crate::recommendation::RankedRecommendation;
use crate::traits::Filter;
use tracing::debug;

/// Filters run in insertion order; each sees the previous one's output.
///
/// ```ignore
/// let pipeline = FilterPipeline::new().add_filter(HighlyRatedFilter::new(4.5));
/// let shown = pipeline.apply(ranked);
/// ```
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn apply(&self, ranked: Vec<RankedRecommendation>) -> Vec<RankedRecommendation> {
        self.filters.iter().fold(ranked, |current, filter| {
            let before = current.len();
            let kept = filter.apply(current);
            debug!("{} kept {} of {} recommendations", filter.name(), kept.len(), before);
            kept
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::HighlyRatedFilter;
    use data_loader::Restaurant;

    fn ranked() -> Vec<RankedRecommendation> {
        vec![
            RankedRecommendation::content_only(Restaurant::new("1", "Italian", 2, 4.0), 3.0),
            RankedRecommendation::content_only(Restaurant::new("2", "Japanese", 4, 4.9), 0.0),
        ]
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let filtered = pipeline.apply(ranked());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_single_filter() {
        let pipeline = FilterPipeline::new().add_filter(HighlyRatedFilter::default());

        let filtered = pipeline.apply(ranked());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id(), "2");
    }

    #[test]
    fn test_filters_run_in_sequence() {
        let pipeline = FilterPipeline::new()
            .add_filter(HighlyRatedFilter::new(3.5))
            .add_filter(HighlyRatedFilter::new(4.5));

        let filtered = pipeline.apply(ranked());
        assert_eq!(filtered.len(), 1);
        assert_eq!(pipeline.len(), 2);
    }
}
