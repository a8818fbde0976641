//! Parser for restaurant snapshot files.
//!
//! A snapshot directory holds one JSON array per collection:
//! - restaurants.json: restaurant documents (required)
//! - reviews.json: review documents with `userId`, `restaurantId`, `rating` (required)
//! - preferences.json: preference documents keyed by `userId` (optional)
//! - favourites.json / dislikes.json: `{userId, restaurantId}` pairs (optional)
//!
//! Optional files that are missing load as empty collections, which is the
//! same thing the data layer reports for a user with no documents.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

pub const RESTAURANTS_FILE: &str = "restaurants.json";
pub const REVIEWS_FILE: &str = "reviews.json";
pub const PREFERENCES_FILE: &str = "preferences.json";
pub const FAVOURITES_FILE: &str = "favourites.json";
pub const DISLIKES_FILE: &str = "dislikes.json";

/// Read a JSON array of records from `path`.
///
/// When `required` is false a missing file yields an empty Vec.
fn read_records<T: DeserializeOwned>(path: &Path, required: bool) -> Result<Vec<T>> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !path.exists() {
        if required {
            return Err(DataLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("Optional snapshot file {} not present", file_name);
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| DataLoadError::ParseError {
        file: file_name,
        reason: e.to_string(),
    })
}

/// Parse restaurants.json
pub fn parse_restaurants(path: &Path) -> Result<Vec<Restaurant>> {
    read_records(path, true)
}

/// Parse reviews.json
///
/// Reviews with a missing `rating` are kept here; dropping them is the
/// rating transform's decision, not the loader's.
pub fn parse_reviews(path: &Path) -> Result<Vec<RatingEvent>> {
    read_records(path, true)
}

/// Parse preferences.json
pub fn parse_preferences(path: &Path) -> Result<Vec<PreferencesRecord>> {
    read_records(path, false)
}

/// Parse favourites.json or dislikes.json
pub fn parse_interactions(path: &Path) -> Result<Vec<InteractionRecord>> {
    read_records(path, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/sample")
    }

    #[test]
    fn test_missing_required_file() {
        let result = parse_restaurants(Path::new("/definitely/not/here/restaurants.json"));
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }

    #[test]
    fn test_missing_optional_file_is_empty() {
        let records = parse_interactions(Path::new("/definitely/not/here/dislikes.json")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_sample_snapshot() {
        let dir = sample_dir();
        let restaurants = parse_restaurants(&dir.join(RESTAURANTS_FILE)).unwrap();
        let reviews = parse_reviews(&dir.join(REVIEWS_FILE)).unwrap();
        let preferences = parse_preferences(&dir.join(PREFERENCES_FILE)).unwrap();

        assert!(!restaurants.is_empty());
        assert!(!reviews.is_empty());
        assert!(preferences.iter().any(|p| !p.preferences.cuisines.is_empty()));
    }
}
