//! Simple test harness for the recommendation orchestrator.
//!
//! Loads a snapshot directory, trains the first model and prints both
//! filter modes for every known user.
//!
//! Usage: `server [DATA_DIR] [CONFIG_FILE]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use data_loader::DataIndex;
use pipeline::{FilterMode, RankingError};
use server::{EngineConfig, RecommendationOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,pipeline=debug")),
        )
        .init();

    info!("Starting restaurant recommendation test harness");

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data/sample".to_string()));
    let config = match args.next() {
        Some(path) => EngineConfig::from_file(&PathBuf::from(path))?,
        None => EngineConfig::default(),
    };

    info!("Loading data index from {}...", data_dir.display());
    let data_index = Arc::new(
        DataIndex::load_from_dir(&data_dir)
            .with_context(|| format!("Failed to load snapshot from {}", data_dir.display()))?,
    );

    let orchestrator = RecommendationOrchestrator::bootstrap(Arc::clone(&data_index), config).await?;

    for user_id in data_index.known_user_ids() {
        for filter in [FilterMode::All, FilterMode::HighlyRated] {
            match orchestrator.get_recommendations(user_id, filter).await {
                Ok(recommendations) => {
                    info!("{} recommendations for {} ({})", recommendations.len(), user_id, filter);
                    for (i, rec) in recommendations.iter().take(5).enumerate() {
                        info!(
                            "{}. {} [{}] - Score: {:.3} ({:?})",
                            i + 1,
                            rec.restaurant.name,
                            rec.restaurant.cuisine_type,
                            rec.score,
                            rec.mode
                        );
                    }
                }
                Err(e) if e.downcast_ref::<RankingError>() == Some(&RankingError::ModelUnavailable) => {
                    warn!("Model unavailable; no recommendations for {}", user_id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    let stats = orchestrator.cache_stats();
    info!("Cache holds {} lists ({} recommendations)", stats.valid, stats.total_recommendations);

    Ok(())
}
