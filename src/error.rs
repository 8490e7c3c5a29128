//! Error types for the pelada service
//!
//! Domain failures are expressed as `PeladaError` variants and carried through
//! `anyhow` so callers can downcast when they need to react to a specific case.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating, season and standings scenarios
#[derive(Debug, thiserror::Error)]
pub enum PeladaError {
    #[error("Invalid vote: {reason}")]
    InvalidVote { reason: String },

    #[error("Invalid organization settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Another active season already exists for organization {organization_id}")]
    SeasonConflict { organization_id: u64 },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl PeladaError {
    /// Whether this error is the active-season uniqueness violation
    pub fn is_season_conflict(error: &anyhow::Error) -> bool {
        matches!(
            error.downcast_ref::<PeladaError>(),
            Some(PeladaError::SeasonConflict { .. })
        )
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        PeladaError::StorageError {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
