//! Utility functions for the pelada service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique season ID
pub fn generate_season_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a comma-separated list of numeric IDs, ignoring blank entries
pub fn parse_id_list(raw: &str) -> Result<Vec<u64>, std::num::ParseIntError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}
