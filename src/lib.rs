//! Pelada - ratings, seasons and standings for amateur soccer organizations
//!
//! This crate computes position-weighted overall ratings from organization
//! scoped player attributes, tracks season windows with per-season overall
//! snapshots, and builds tournament standings from finished matches.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod season;
pub mod service;
pub mod standings;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{PeladaError, Result};
pub use types::*;

// Re-export key components
pub use rating::{calculate_overall, OverallCalculator, PositionWeightedCalculator};
pub use season::{SeasonStore, SeasonTracker};
pub use standings::{build_standings, fold_standings, StandingsTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
