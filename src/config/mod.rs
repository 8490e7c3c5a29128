//! Configuration management for the pelada service
//!
//! Configuration is loaded from environment variables or a TOML file,
//! validated, and then optionally overridden from the command line.

pub mod app;
pub mod rating;
pub mod season;

// Re-export commonly used types
pub use app::{validate_config, AdminSettings, AppConfig, ServiceSettings};
pub use rating::RatingSettings;
pub use season::SeasonSettings;
