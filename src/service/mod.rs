//! Service layer for the pelada service
//!
//! This module contains the application state that coordinates ratings,
//! seasons and standings, plus the health checks built on top of it.

pub mod app;
pub mod health;

pub use app::{ActiveSeasonView, AppState, RatingUpdate, ServiceError, VoteOutcome};
pub use health::{ComponentCheck, HealthCheck, HealthStatus, ServiceStats};
