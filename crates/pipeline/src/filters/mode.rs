//! The closed set of list filters a caller can ask for.

use crate::filter_pipeline::FilterPipeline;
use crate::filters::HighlyRatedFilter;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// No filtering
    #[default]
    All,
    /// Only restaurants rated at or above the highly-rated threshold
    HighlyRated,
}

impl FilterMode {
    /// Read a filter name as sent by clients.
    ///
    /// Matching ignores case, spaces, dashes and underscores, so
    /// `"Highly Rated"`, `"highly-rated"` and `"HIGHLY_RATED"` all work.
    /// Anything unrecognized falls back to [`FilterMode::All`].
    pub fn parse(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "highlyrated" => FilterMode::HighlyRated,
            _ => FilterMode::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::All => "All",
            FilterMode::HighlyRated => "Highly Rated",
        }
    }

    /// The post-ranking filters this mode stands for
    pub fn pipeline(&self, highly_rated_min_rating: f64) -> FilterPipeline {
        match self {
            FilterMode::All => FilterPipeline::new(),
            FilterMode::HighlyRated => {
                FilterPipeline::new().add_filter(HighlyRatedFilter::new(highly_rated_min_rating))
            }
        }
    }
}

impl From<&str> for FilterMode {
    fn from(name: &str) -> Self {
        FilterMode::parse(name)
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_names() {
        assert_eq!(FilterMode::parse("Highly Rated"), FilterMode::HighlyRated);
        assert_eq!(FilterMode::parse("highly-rated"), FilterMode::HighlyRated);
        assert_eq!(FilterMode::parse("HIGHLY_RATED"), FilterMode::HighlyRated);
        assert_eq!(FilterMode::parse("All"), FilterMode::All);
        assert_eq!(FilterMode::parse(""), FilterMode::All);
        assert_eq!(FilterMode::parse("Nearby"), FilterMode::All);
    }

    #[test]
    fn test_label_round_trips() {
        for mode in [FilterMode::All, FilterMode::HighlyRated] {
            assert_eq!(FilterMode::parse(mode.label()), mode);
        }
    }

    #[test]
    fn test_pipeline_sizes() {
        assert!(FilterMode::All.pipeline(4.5).is_empty());
        assert_eq!(FilterMode::HighlyRated.pipeline(4.5).len(), 1);
    }
}
