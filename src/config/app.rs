//! Main application configuration
//!
//! This module defines the primary configuration structures for the pelada
//! service, including environment variable and TOML loading and validation.

use crate::config::rating::RatingSettings;
use crate::config::season::SeasonSettings;
use crate::types::{UserId, MAX_SEASON_DURATION_DAYS};
use crate::utils::parse_id_list;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub ratings: RatingSettings,
    pub seasons: SeasonSettings,
    pub admin: AdminSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and health output
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Host the HTTP API binds to
    pub http_host: String,
    /// Port the HTTP API binds to
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Authorization settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Users treated as super admins regardless of their account flag
    pub super_admin_ids: Vec<UserId>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "pelada".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a TOML file. Missing sections use defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Service settings
        if let Some(name) = lookup("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Some(host) = lookup("HTTP_HOST") {
            config.service.http_host = host;
        }
        if let Some(port) = lookup("HTTP_PORT") {
            config.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Some(timeout) = lookup("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Rating settings
        if let Some(value) = lookup("DEFAULT_ATTRIBUTE") {
            config.ratings.default_attribute = value
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_ATTRIBUTE value: {}", value))?;
        }
        if let Some(value) = lookup("DEFAULT_SPORTSMANSHIP") {
            config.ratings.default_sportsmanship = value
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_SPORTSMANSHIP value: {}", value))?;
        }

        // Season settings
        if let Some(enabled) = lookup("SEASONS_ENABLED_BY_DEFAULT") {
            config.seasons.enabled_by_default = enabled
                .parse()
                .map_err(|_| anyhow!("Invalid SEASONS_ENABLED_BY_DEFAULT value: {}", enabled))?;
        }
        if let Some(days) = lookup("DEFAULT_SEASON_DURATION_DAYS") {
            config.seasons.default_duration_days = days
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_SEASON_DURATION_DAYS value: {}", days))?;
        }
        if let Some(retries) = lookup("SEASON_CONFLICT_RETRIES") {
            config.seasons.conflict_retries = retries
                .parse()
                .map_err(|_| anyhow!("Invalid SEASON_CONFLICT_RETRIES value: {}", retries))?;
        }

        // Admin settings
        if let Some(ids) = lookup("SUPER_ADMIN_IDS") {
            config.admin.super_admin_ids =
                parse_id_list(&ids).map_err(|_| anyhow!("Invalid SUPER_ADMIN_IDS value: {}", ids))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Address the HTTP API binds to
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.http_host, self.service.http_port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate rating defaults
    if config.ratings.default_attribute > 100 {
        return Err(anyhow!("Default attribute must be between 0 and 100"));
    }
    if config.ratings.default_sportsmanship > 100 {
        return Err(anyhow!("Default sportsmanship must be between 0 and 100"));
    }

    // Validate season settings
    if config.seasons.default_duration_days == 0 {
        return Err(anyhow!("Default season duration must be greater than 0"));
    }
    if config.seasons.default_duration_days > MAX_SEASON_DURATION_DAYS {
        return Err(anyhow!(
            "Default season duration must be at most {} days",
            MAX_SEASON_DURATION_DAYS
        ));
    }

    Ok(())
}
