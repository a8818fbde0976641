//! Output types of a ranking request.

use data_loader::Restaurant;
use serde::Serialize;

/// How a user's list was scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Too little history, or unknown to the model: preferences only
    ContentOnly,
    /// Normalized blend of model prediction and content score
    Hybrid,
}

/// The parts that produced a recommendation's score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreComponents {
    /// Raw model estimate; `None` in content-only mode
    pub predicted: Option<f64>,
    pub content: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
}

/// A restaurant with its ranking score.
///
/// Serializes as the restaurant's own fields plus `score`,
/// `scoreComponents` and `mode`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRecommendation {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub score: f64,
    pub score_components: ScoreComponents,
    pub mode: RankingMode,
}

impl RankedRecommendation {
    pub fn content_only(restaurant: Restaurant, content: f64) -> Self {
        Self {
            restaurant,
            score: content,
            score_components: ScoreComponents {
                predicted: None,
                content,
                final_score: content,
            },
            mode: RankingMode::ContentOnly,
        }
    }

    pub fn hybrid(restaurant: Restaurant, predicted: f64, content: f64, final_score: f64) -> Self {
        Self {
            restaurant,
            score: final_score,
            score_components: ScoreComponents {
                predicted: Some(predicted),
                content,
                final_score,
            },
            mode: RankingMode::Hybrid,
        }
    }

    pub fn id(&self) -> &str {
        &self.restaurant.id
    }
}
