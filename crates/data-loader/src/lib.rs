//! # Data Loader Crate
//!
//! Supplies the recommendation engine with already-materialized collections:
//! restaurants, review events, per-user preferences, and the favourites and
//! dislikes used for exclusion.
//!
//! ## Main Components
//!
//! - **types**: Domain types (Restaurant, RatingEvent, UserPreferences, DataIndex)
//! - **parser**: Parse JSON snapshot files into Rust structs
//! - **index**: Build per-user and cuisine indices, compute review statistics
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_dir(Path::new("data/sample"))?;
//!
//! let prefs = index.get_preferences("alice");
//! let excluded = index.excluded_restaurants("alice");
//! println!("alice wrote {} reviews", index.review_count("alice"));
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    RestaurantId,
    // Core types
    Restaurant,
    RatingEvent,
    UserPreferences,
    PreferencesRecord,
    InteractionRecord,
    DataIndex,
    RestaurantStats,
    // Enums
    PriceValue,
    InteractionKind,
};
