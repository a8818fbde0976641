use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::DataIndex;
use factorization::{LatentFactorModel, TrainingSignal, transform_ratings};
use pipeline::{FilterMode, RankedRecommendation, RankingError, RankingMode};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use server::{EngineConfig, RecommendationOrchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

const MAX_PRICE_TIER: i64 = 4;

/// Restaurant Recs - Hybrid Restaurant Recommendation Engine
#[derive(Parser)]
#[command(name = "restaurant-recs")]
#[command(about = "Restaurant recommendations blending matrix factorization with user preferences", long_about = None)]
struct Cli {
    /// Path to the snapshot directory (restaurants.json, reviews.json, ...)
    #[arg(short, long, default_value = "data/sample")]
    data_dir: PathBuf,

    /// JSON engine configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get restaurant recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: String,

        /// "All" or "Highly Rated"
        #[arg(long, default_value = "All")]
        filter: String,

        /// Number of recommendations to show
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Show the score components of each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Show a user's preferences, reviews and exclusions
    User {
        /// User ID to display
        #[arg(long)]
        user_id: String,
    },

    /// Search for restaurants by name
    Search {
        /// Name to search for (case-insensitive substring match)
        #[arg(long)]
        name: String,
    },

    /// Train on part of the reviews and report held-out error
    Train {
        /// Fraction of training signals held out for evaluation
        #[arg(long, default_value = "0.2")]
        holdout: f64,

        /// Seed for the split and the factor initialisation
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    println!("Loading snapshot from {}...", cli.data_dir.display());
    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_dir(&cli.data_dir).context("Failed to load restaurant snapshot")?,
    );
    let (restaurants, reviews, preferences) = data_index.counts();
    println!(
        "{} Loaded {} restaurants, {} reviews, {} preference records in {:?}",
        "✓".green(),
        restaurants,
        reviews,
        preferences,
        start.elapsed()
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            filter,
            limit,
            explain,
        } => handle_recommend(data_index, config, &user_id, &filter, limit, explain).await?,
        Commands::User { user_id } => handle_user(&data_index, &user_id),
        Commands::Search { name } => handle_search(&data_index, &name),
        Commands::Train { holdout, seed } => handle_train(&data_index, config, holdout, seed)?,
        Commands::Benchmark { requests } => handle_benchmark(data_index, config, requests).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading engine config from {}", path.display());
            EngineConfig::from_file(path)?
        }
        None => EngineConfig::default(),
    };
    config.validate().context("Invalid engine configuration")?;
    Ok(config)
}

/// Handle the 'recommend' command
async fn handle_recommend(
    data_index: Arc<DataIndex>,
    config: EngineConfig,
    user_id: &str,
    filter: &str,
    limit: usize,
    explain: bool,
) -> Result<()> {
    let filter = FilterMode::parse(filter);
    let orchestrator = RecommendationOrchestrator::bootstrap(data_index, config).await?;

    let recommendations = match orchestrator.get_recommendations(user_id, filter).await {
        Ok(recommendations) => recommendations,
        Err(e) if e.downcast_ref::<RankingError>() == Some(&RankingError::ModelUnavailable) => {
            bail!("Recommendations are unavailable: there are no reviews to train on")
        }
        Err(e) => return Err(e),
    };

    if recommendations.is_empty() {
        println!(
            "{}",
            format!("No recommendations for {user_id} ({filter}). Add preferences or reviews first.").yellow()
        );
        return Ok(());
    }

    print_recommendations(user_id, filter, &recommendations, limit, explain);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(data_index: &DataIndex, user_id: &str) {
    println!("{}", format!("User: {user_id}").bold().blue());

    match data_index.get_preferences(user_id) {
        Some(prefs) => {
            let mut cuisines: Vec<&str> = prefs.cuisines.iter().map(String::as_str).collect();
            cuisines.sort_unstable();
            println!("{}Cuisines: {}", "• ".green(), cuisines.join(", "));
            match prefs.price_range.as_ref().and_then(|p| p.as_level()) {
                Some(level) => println!("{}Price range: {}", "• ".green(), price_tier(level)),
                None => println!("{}Price range: not set", "• ".green()),
            }
            if !prefs.dietary_restrictions.is_empty() {
                println!("{}Dietary: {}", "• ".green(), prefs.dietary_restrictions.join(", "));
            }
        }
        None => println!("{}No preferences saved", "• ".green()),
    }

    let reviews = data_index.get_user_reviews(user_id);
    let ratings: Vec<f64> = reviews.iter().filter_map(|r| r.raw_rating).collect();
    let avg_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    };
    println!("{}Number of reviews: {}", "• ".cyan(), reviews.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), avg_rating);

    if !reviews.is_empty() {
        println!("Reviews:");
        for review in &reviews {
            let name = data_index
                .get_restaurant(&review.restaurant_id)
                .map_or(review.restaurant_id.as_str(), |r| r.name.as_str());
            let rating = review
                .raw_rating
                .map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
            let date = review
                .created_at
                .map_or_else(|| "undated".to_string(), |t| t.format("%Y-%m-%d").to_string());
            println!("  - {name}: {rating} ({date}, {} helpful)", review.helpful_votes);
        }
    }

    for (label, ids) in [
        ("Favourites", data_index.get_favourites(user_id)),
        ("Dislikes", data_index.get_dislikes(user_id)),
    ] {
        let mut names: Vec<&str> = ids
            .into_iter()
            .flatten()
            .map(|id| data_index.get_restaurant(id).map_or(id.as_str(), |r| r.name.as_str()))
            .collect();
        names.sort_unstable();
        if names.is_empty() {
            println!("{}: none", label);
        } else {
            println!("{}: {}", label, names.join(", "));
        }
    }
}

/// Handle the 'search' command
fn handle_search(data_index: &DataIndex, name: &str) {
    let needle = name.to_lowercase();
    let mut matches = data_index.search_by_name(name);

    // Exact matches first, then by rating
    matches.sort_by(|a, b| {
        let a_exact = a.name.to_lowercase() != needle;
        let b_exact = b.name.to_lowercase() != needle;
        a_exact.cmp(&b_exact).then_with(|| b.rating.total_cmp(&a.rating))
    });

    println!("{}", format!("Search results for '{name}':").bold().blue());
    if matches.is_empty() {
        println!("  no restaurants match");
    }
    for restaurant in matches.iter().take(20) {
        let stats = data_index.get_restaurant_stats(&restaurant.id);
        println!(
            "{}: {} [{}] rated {:.1}, {} reviews here (avg {:.2})",
            restaurant.id,
            restaurant.name,
            restaurant.cuisine_type,
            restaurant.rating,
            stats.map_or(0, |s| s.review_count),
            stats.map_or(0.0, |s| s.avg_review_rating)
        );
    }
}

/// Handle the 'train' command
fn handle_train(
    data_index: &DataIndex,
    config: EngineConfig,
    holdout: f64,
    seed: Option<u64>,
) -> Result<()> {
    if !(0.0..1.0).contains(&holdout) {
        bail!("--holdout must be in [0, 1), got {holdout}");
    }

    let seed = seed.unwrap_or_else(rand::random);
    let mut signals = transform_ratings(data_index.rating_events(), Utc::now(), &config.transform);
    let mut rng = StdRng::seed_from_u64(seed);
    signals.shuffle(&mut rng);

    let test_len = (signals.len() as f64 * holdout).round() as usize;
    let (test, train) = signals.split_at(test_len);
    println!(
        "Training on {} signals, holding out {} (seed {})",
        train.len(),
        test.len(),
        seed
    );

    let start = Instant::now();
    let model_config = config.model.with_seed(seed);
    let Some(model) = LatentFactorModel::train(train, &model_config)? else {
        bail!("Nothing to train on: no usable reviews in the training split");
    };
    println!(
        "{} Trained rank-{} model on {} users x {} restaurants in {:?}",
        "✓".green(),
        model.rank(),
        model.n_users(),
        model.n_items(),
        start.elapsed()
    );

    println!("{}", "Training RMSE per epoch:".bold().blue());
    for (epoch, rmse) in model.epoch_rmse().iter().enumerate() {
        println!("  epoch {:>3}: {:.4}", epoch + 1, rmse);
    }

    match model.rmse(test) {
        Some(rmse) => {
            let baseline = mean_baseline_rmse(&model, test);
            println!("Held-out RMSE: {:.4} (global mean baseline {:.4})", rmse, baseline);
        }
        None => println!("Held-out RMSE: n/a (empty holdout)"),
    }
    Ok(())
}

fn mean_baseline_rmse(model: &LatentFactorModel, signals: &[TrainingSignal]) -> f64 {
    let squared: f64 = signals
        .iter()
        .map(|s| (s.weight - model.global_mean()).powi(2))
        .sum();
    (squared / signals.len() as f64).sqrt()
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    data_index: Arc<DataIndex>,
    config: EngineConfig,
    requests: usize,
) -> Result<()> {
    let user_ids: Vec<String> = data_index.known_user_ids().into_iter().map(String::from).collect();
    if user_ids.is_empty() {
        bail!("The snapshot has no users to benchmark with");
    }

    let orchestrator = RecommendationOrchestrator::bootstrap(data_index, config).await?;

    // Pick users up front; the thread-local rng cannot cross an await
    let picks: Vec<(String, FilterMode)> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|_| {
                let user = user_ids[rng.random_range(0..user_ids.len())].clone();
                let filter = if rng.random_bool(0.5) {
                    FilterMode::All
                } else {
                    FilterMode::HighlyRated
                };
                (user, filter)
            })
            .collect()
    };

    let wall_clock = Instant::now();
    let mut handles = vec![];
    for (user, filter) in picks {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            orchestrator.get_recommendations(&user, filter).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(handles.len());
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    if timings.is_empty() {
        println!("No requests made");
        return Ok(());
    }
    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let throughput = timings.len() as f64 / total_time.as_secs_f64();
    let cache = orchestrator.cache_stats();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);
    println!("Cached lists: {} ({} recommendations)", cache.valid, cache.total_recommendations);

    Ok(())
}

/// Print the top `limit` entries of a ranked list
fn print_recommendations(
    user_id: &str,
    filter: FilterMode,
    recommendations: &[RankedRecommendation],
    limit: usize,
    explain: bool,
) {
    let mode = match recommendations[0].mode {
        RankingMode::ContentOnly => "content-only",
        RankingMode::Hybrid => "hybrid",
    };
    println!(
        "{}",
        format!("Recommendations for {user_id} ({filter}, {mode}):").bold().blue()
    );

    for (rank, rec) in recommendations.iter().take(limit).enumerate() {
        let price = rec
            .restaurant
            .price_level
            .as_ref()
            .and_then(|p| p.as_level())
            .map_or_else(|| "?".to_string(), price_tier);
        println!(
            "{}. {} [{}, {}] rated {:.1} - Score: {:.3}",
            (rank + 1).to_string().green(),
            rec.restaurant.name,
            rec.restaurant.cuisine_type,
            price,
            rec.restaurant.rating,
            rec.score
        );
        if explain {
            let components = &rec.score_components;
            match components.predicted {
                Some(predicted) => println!(
                    "   predicted {:.2}, content {:.1}, final {:.3}",
                    predicted, components.content, components.final_score
                ),
                None => println!("   content {:.1} (no model prediction)", components.content),
            }
        }
    }

    if recommendations.len() > limit {
        println!("  ... and {} more", recommendations.len() - limit);
    }
}

/// Dollar signs for a price level, capped at four
fn price_tier(level: i64) -> String {
    "$".repeat(level.clamp(0, MAX_PRICE_TIER) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_tier_is_bounded() {
        assert_eq!(price_tier(2), "$$");
        assert_eq!(price_tier(-3), "");
        assert_eq!(price_tier(i64::MAX), "$$$$");
    }
}
