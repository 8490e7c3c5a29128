//! Main application state and service coordination
//!
//! `AppState` wires the rating, season and standings components together and
//! exposes the operations the HTTP API calls.

use crate::auth::{Actor, AdminCapability, SuperAdminPolicy};
use crate::config::AppConfig;
use crate::error::{PeladaError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{
    AttributeEntry, AttributeStorage, InMemoryAttributeStorage, OverallCalculator,
    OverallResult, PlayerVote, PositionWeightedCalculator, RatingRole, VoteBook,
};
use crate::season::{
    BootstrapReport, Clock, InMemorySeasonStore, SeasonStore, SeasonTracker, SystemClock,
};
use crate::standings::fold_standings;
use crate::types::{
    MatchRecord, OrganizationId, OrganizationSettings, PlayerAttributes, PlayerId,
    PlayerSeasonOverallSnapshot, PositionProfile, Season, SeasonRef, StandingRow, TeamId,
    TournamentId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Result of a rating-affecting write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub overall: u8,
    pub role: Option<RatingRole>,
    pub season: SeasonRef,
}

/// Result of casting a peer vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    /// Whether an earlier vote by the same voter was replaced
    pub replaced: bool,
    /// Votes now counted for the player
    pub votes: usize,
    pub rating: RatingUpdate,
}

/// Season currently in effect for an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSeasonView {
    pub season: SeasonRef,
    /// Details of the season window, absent for `all_time`
    pub details: Option<Season>,
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Organization-scoped pivot attributes
    attributes: Arc<dyn AttributeStorage>,

    /// Peer votes
    votes: VoteBook,

    /// Season lifecycle and snapshots
    tracker: SeasonTracker,

    calculator: Arc<dyn OverallCalculator>,

    admin_policy: SuperAdminPolicy,

    /// Settings stored per organization; others use configured defaults
    organization_settings: std::sync::RwLock<HashMap<OrganizationId, OrganizationSettings>>,

    metrics: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with in-memory storage and the system clock
    pub fn new(config: AppConfig) -> std::result::Result<Self, ServiceError> {
        info!("Initializing pelada service");

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        Self::with_components(
            config,
            Arc::new(InMemoryAttributeStorage::new()),
            Arc::new(InMemorySeasonStore::new()),
            Arc::new(SystemClock),
            metrics,
        )
    }

    /// Initialize the application from explicit storage, clock and metrics
    pub fn with_components(
        config: AppConfig,
        attributes: Arc<dyn AttributeStorage>,
        season_store: Arc<dyn SeasonStore>,
        clock: Arc<dyn Clock>,
        metrics: Arc<MetricsCollector>,
    ) -> std::result::Result<Self, ServiceError> {
        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let calculator = Arc::new(PositionWeightedCalculator::new(
            config.ratings.default_attributes(),
        ));
        let tracker = SeasonTracker::new(season_store, clock, metrics.clone());
        let admin_policy = SuperAdminPolicy::new(config.admin.super_admin_ids.iter().copied());

        info!(
            "Configuration: service={}, default_attribute={}, conflict_retries={}, super_admins={}",
            config.service.name,
            config.ratings.default_attribute,
            config.seasons.conflict_retries,
            config.admin.super_admin_ids.len()
        );

        Ok(Self {
            config,
            attributes,
            votes: VoteBook::new(),
            tracker,
            calculator,
            admin_policy,
            organization_settings: std::sync::RwLock::new(HashMap::new()),
            metrics,
            background_tasks: Vec::new(),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Mark the service running and start background tasks
    pub async fn start(&mut self) -> std::result::Result<(), ServiceError> {
        info!("Starting pelada service");

        *self.is_running.write().await = true;
        self.start_background_tasks();

        info!("✅ Pelada service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> std::result::Result<(), ServiceError> {
        info!("Starting graceful shutdown of pelada service");

        *self.is_running.write().await = false;
        self.stop_background_tasks();

        match (self.attributes.member_count(), self.tracker.store().snapshot_count()) {
            (Ok(members), Ok(snapshots)) => {
                info!(
                    "Final service statistics: {} memberships, {} snapshots",
                    members, snapshots
                );
            }
            _ => warn!("Failed to gather final statistics"),
        }

        info!("✅ Pelada service shutdown completed");
        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn attributes(&self) -> &Arc<dyn AttributeStorage> {
        &self.attributes
    }

    pub fn tracker(&self) -> &SeasonTracker {
        &self.tracker
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Check an actor against the super-admin policy
    pub fn authorize(&self, actor: &Actor) -> Result<AdminCapability> {
        self.admin_policy.authorize(actor)
    }

    /// Compute an overall without storing anything
    pub fn calculate_overall(
        &self,
        attributes: &PlayerAttributes,
        profile: &PositionProfile,
    ) -> OverallResult {
        let result = self.calculator.calculate(attributes, profile);
        self.metrics.record_overall(result.role, result.overall);
        result
    }

    /// Settings in effect for an organization
    pub fn organization_settings(&self, organization_id: OrganizationId) -> Result<OrganizationSettings> {
        let settings = self
            .organization_settings
            .read()
            .map_err(|_| PeladaError::lock_poisoned("organization settings read"))?;

        Ok(settings
            .get(&organization_id)
            .cloned()
            .unwrap_or_else(|| self.config.seasons.default_organization_settings()))
    }

    /// Store an organization's season settings.
    ///
    /// Turning seasons off leaves any active season in place; later writes
    /// snapshot under `all_time` until seasons are turned back on.
    pub fn configure_organization(
        &self,
        capability: &AdminCapability,
        organization_id: OrganizationId,
        settings: OrganizationSettings,
    ) -> Result<OrganizationSettings> {
        settings.validate()?;

        let mut stored = self
            .organization_settings
            .write()
            .map_err(|_| PeladaError::lock_poisoned("organization settings write"))?;
        stored.insert(organization_id, settings.clone());

        info!(
            "User {} configured organization {}: seasons_enabled={}, duration={:?}",
            capability.granted_to(),
            organization_id,
            settings.seasons_enabled,
            settings.season_duration_days
        );
        Ok(settings)
    }

    /// Replace a member's attributes and snapshot the new overall
    pub fn update_attributes(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
        attributes: PlayerAttributes,
        profile: PositionProfile,
    ) -> Result<RatingUpdate> {
        let mut entry = self
            .attributes
            .get_attributes(organization_id, player_id)?
            .unwrap_or_else(|| AttributeEntry::new(organization_id, player_id, profile.clone()));
        entry.update_attributes(attributes, profile);

        let stored_attributes = entry.attributes.unwrap_or(attributes);
        let result = self.calculate_overall(&stored_attributes, &entry.profile);

        // Nothing is stored unless the snapshot landed
        let season = self.record_overall(organization_id, player_id, result.overall)?;
        self.attributes.store_attributes(entry)?;
        debug!(
            "Player {} in organization {} now rated {} ({})",
            player_id, organization_id, result.overall, season
        );

        Ok(RatingUpdate {
            overall: result.overall,
            role: result.role,
            season,
        })
    }

    /// Add a player to an organization and snapshot their default overall
    pub fn add_member(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
        profile: PositionProfile,
    ) -> Result<RatingUpdate> {
        if self
            .attributes
            .get_attributes(organization_id, player_id)?
            .is_some()
        {
            return Err(PeladaError::InvalidRequest {
                reason: format!(
                    "player {} already belongs to organization {}",
                    player_id, organization_id
                ),
            }
            .into());
        }

        let entry = AttributeEntry::new(organization_id, player_id, profile);
        let result = self.calculate_overall(&self.calculator.default_attributes(), &entry.profile);

        let season = self.record_overall(organization_id, player_id, result.overall)?;
        self.attributes.store_attributes(entry)?;
        info!(
            "Player {} joined organization {} with overall {}",
            player_id, organization_id, result.overall
        );

        Ok(RatingUpdate {
            overall: result.overall,
            role: result.role,
            season,
        })
    }

    /// Remove a player from an organization. Snapshots already taken are kept.
    pub fn remove_member(&self, organization_id: OrganizationId, player_id: PlayerId) -> Result<()> {
        if !self.attributes.remove_member(organization_id, player_id)? {
            return Err(PeladaError::NotFound {
                what: format!("player {} in organization {}", player_id, organization_id),
            }
            .into());
        }

        info!("Player {} left organization {}", player_id, organization_id);
        Ok(())
    }

    /// Record a peer vote and re-rate the player from the aggregated votes
    pub fn cast_vote(&self, vote: PlayerVote) -> Result<VoteOutcome> {
        let organization_id = vote.organization_id;
        let player_id = vote.player_id;

        self.require_member(organization_id, vote.voter_id)?;
        let entry = self.require_member(organization_id, player_id)?;

        let replaced = self.votes.cast(vote)?;
        self.metrics.record_vote();

        let aggregated = self
            .votes
            .aggregate(organization_id, player_id)?
            .ok_or_else(|| PeladaError::StorageError {
                message: format!("vote for player {} was not stored", player_id),
            })?;
        let votes = self.votes.vote_count(organization_id, player_id)?;

        let rating = self.update_attributes(organization_id, player_id, aggregated, entry.profile)?;

        Ok(VoteOutcome {
            replaced,
            votes,
            rating,
        })
    }

    /// Snapshot every member of an organization
    pub fn bootstrap_organization(
        &self,
        capability: &AdminCapability,
        organization_id: OrganizationId,
    ) -> Result<BootstrapReport> {
        info!(
            "User {} bootstrapping snapshots for organization {}",
            capability.granted_to(),
            organization_id
        );

        let settings = self.organization_settings(organization_id)?;
        self.with_conflict_retries(organization_id, || {
            self.tracker.bootstrap_organization(
                organization_id,
                &settings,
                self.attributes.as_ref(),
                self.calculator.as_ref(),
            )
        })
    }

    /// Season currently in effect. Does not open or roll over seasons.
    pub fn active_season(&self, organization_id: OrganizationId) -> Result<ActiveSeasonView> {
        let settings = self.organization_settings(organization_id)?;
        if settings.effective_duration_days().is_none() {
            return Ok(ActiveSeasonView {
                season: SeasonRef::AllTime,
                details: None,
            });
        }

        match self.tracker.store().active_season(organization_id)? {
            Some(season) => Ok(ActiveSeasonView {
                season: SeasonRef::Season(season.id),
                details: Some(season),
            }),
            None => Err(PeladaError::NotFound {
                what: format!("active season for organization {}", organization_id),
            }
            .into()),
        }
    }

    /// Snapshot time series of a player, oldest first
    pub fn player_history(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerSeasonOverallSnapshot>> {
        self.tracker
            .store()
            .player_snapshots(organization_id, player_id)
    }

    /// Ranked standings of a tournament
    pub fn standings(
        &self,
        tournament_id: TournamentId,
        matches: &[MatchRecord],
        registered: Option<&[TeamId]>,
    ) -> Vec<StandingRow> {
        let table = fold_standings(tournament_id, matches, registered);
        self.metrics
            .record_standings_build(table.folded(), table.skipped());

        table.ranked()
    }

    fn require_member(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<AttributeEntry> {
        self.attributes
            .get_attributes(organization_id, player_id)?
            .ok_or_else(|| {
                PeladaError::NotFound {
                    what: format!(
                        "player {} in organization {}",
                        player_id, organization_id
                    ),
                }
                .into()
            })
    }

    fn record_overall(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
        overall: u8,
    ) -> Result<SeasonRef> {
        let settings = self.organization_settings(organization_id)?;
        self.with_conflict_retries(organization_id, || {
            self.tracker
                .record_player_overall(organization_id, player_id, &settings, overall)
        })
    }

    /// Re-run `operation` after a season conflict. A re-run reads the
    /// winner's season instead of trying to open another one.
    fn with_conflict_retries<T, F>(&self, organization_id: OrganizationId, operation: F) -> Result<T>
    where
        F: Fn() -> Result<T>,
    {
        let retries = self.config.seasons.conflict_retries;
        let mut attempt = 0;

        loop {
            match operation() {
                Err(e) if PeladaError::is_season_conflict(&e) && attempt < retries => {
                    attempt += 1;
                    warn!(
                        "Season conflict for organization {}, retrying ({}/{})",
                        organization_id, attempt, retries
                    );
                }
                result => return result,
            }
        }
    }

    /// Start background maintenance tasks
    fn start_background_tasks(&mut self) {
        info!("Starting uptime metrics task (60s interval)...");
        let uptime_task = {
            let metrics = self.metrics.clone();
            let is_running = self.is_running.clone();
            let started_at = self.started_at;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                info!("Uptime metrics task started");

                while *is_running.read().await {
                    interval.tick().await;

                    let uptime_seconds = started_at.elapsed().as_secs() as i64;
                    // Health gauges belong to HealthCheck::check
                    metrics.service().uptime_seconds.set(uptime_seconds);

                    debug!("Updated uptime metric: {}s", uptime_seconds);
                }

                info!("Uptime metrics task stopped");
            })
        };

        self.background_tasks.push(uptime_task);
    }

    /// Stop all background tasks
    fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            return;
        }

        for task in self.background_tasks.drain(..) {
            task.abort();
        }
        info!("✅ All {} background tasks stopped", task_count);
    }
}
