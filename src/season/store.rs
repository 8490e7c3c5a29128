//! Season and snapshot persistence
//!
//! The store owns the "one active season per organization" constraint. Opening
//! a season is a single compare-and-swap against the currently active season,
//! so two writers racing on the same organization cannot both succeed.

use crate::error::{PeladaError, Result};
use crate::types::{
    OrganizationId, PlayerId, PlayerSeasonOverallSnapshot, Season, SeasonId, SeasonRef,
};
use crate::utils::generate_season_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Season state change requested from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonTransition {
    /// Open the first active season; fails if one is already active
    First {
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
    /// Close `closing` and open its successor; fails unless `closing` is the active season
    Rollover {
        closing: SeasonId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
}

impl SeasonTransition {
    fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            SeasonTransition::First { starts_at, ends_at }
            | SeasonTransition::Rollover {
                starts_at, ends_at, ..
            } => (*starts_at, *ends_at),
        }
    }
}

/// Outcome of a snapshot upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotWrite {
    Created,
    Updated,
}

/// Key under which snapshots are unique
pub type SnapshotKey = (OrganizationId, PlayerId, SeasonRef);

/// Trait for season and snapshot persistence
pub trait SeasonStore: Send + Sync {
    /// Currently active season of an organization
    fn active_season(&self, organization_id: OrganizationId) -> Result<Option<Season>>;

    /// All seasons ever created for an organization, oldest first
    fn seasons(&self, organization_id: OrganizationId) -> Result<Vec<Season>>;

    /// Atomically apply a season transition and return the newly active season.
    /// Fails with `PeladaError::SeasonConflict` when the expectation does not hold.
    fn open_season(
        &self,
        organization_id: OrganizationId,
        transition: SeasonTransition,
    ) -> Result<Season>;

    /// Create or overwrite the snapshot for its (organization, player, season) key
    fn upsert_snapshot(&self, snapshot: PlayerSeasonOverallSnapshot) -> Result<SnapshotWrite>;

    /// Get a single snapshot
    fn snapshot(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
        season_ref: SeasonRef,
    ) -> Result<Option<PlayerSeasonOverallSnapshot>>;

    /// Snapshot time series of a player, ordered by `recorded_at`
    fn player_snapshots(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerSeasonOverallSnapshot>>;

    /// Total number of stored snapshots
    fn snapshot_count(&self) -> Result<usize>;
}

/// In-memory season store implementation
#[derive(Debug, Default)]
pub struct InMemorySeasonStore {
    seasons: RwLock<HashMap<OrganizationId, Vec<Season>>>,
    snapshots: RwLock<HashMap<SnapshotKey, PlayerSeasonOverallSnapshot>>,
}

impl InMemorySeasonStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeasonStore for InMemorySeasonStore {
    fn active_season(&self, organization_id: OrganizationId) -> Result<Option<Season>> {
        let seasons = self
            .seasons
            .read()
            .map_err(|_| PeladaError::lock_poisoned("seasons read"))?;

        Ok(seasons
            .get(&organization_id)
            .and_then(|list| list.iter().find(|season| season.is_active))
            .cloned())
    }

    fn seasons(&self, organization_id: OrganizationId) -> Result<Vec<Season>> {
        let seasons = self
            .seasons
            .read()
            .map_err(|_| PeladaError::lock_poisoned("seasons read"))?;

        Ok(seasons.get(&organization_id).cloned().unwrap_or_default())
    }

    fn open_season(
        &self,
        organization_id: OrganizationId,
        transition: SeasonTransition,
    ) -> Result<Season> {
        let mut seasons = self
            .seasons
            .write()
            .map_err(|_| PeladaError::lock_poisoned("seasons write"))?;

        let list = seasons.entry(organization_id).or_default();
        let active = list.iter().position(|season| season.is_active);

        match (&transition, active) {
            (SeasonTransition::First { .. }, None) => {}
            (SeasonTransition::Rollover { closing, .. }, Some(index))
                if list[index].id == *closing =>
            {
                list[index].is_active = false;
            }
            _ => return Err(PeladaError::SeasonConflict { organization_id }.into()),
        }

        let (starts_at, ends_at) = transition.window();
        let season = Season {
            id: generate_season_id(),
            organization_id,
            name: format!("Season {}", list.len() + 1),
            starts_at,
            ends_at,
            is_active: true,
        };
        list.push(season.clone());

        Ok(season)
    }

    fn upsert_snapshot(&self, snapshot: PlayerSeasonOverallSnapshot) -> Result<SnapshotWrite> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| PeladaError::lock_poisoned("snapshots write"))?;

        let key = (
            snapshot.organization_id,
            snapshot.player_id,
            snapshot.season_ref,
        );
        let write = if snapshots.contains_key(&key) {
            SnapshotWrite::Updated
        } else {
            SnapshotWrite::Created
        };
        snapshots.insert(key, snapshot);

        Ok(write)
    }

    fn snapshot(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
        season_ref: SeasonRef,
    ) -> Result<Option<PlayerSeasonOverallSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| PeladaError::lock_poisoned("snapshots read"))?;

        Ok(snapshots
            .get(&(organization_id, player_id, season_ref))
            .cloned())
    }

    fn player_snapshots(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerSeasonOverallSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| PeladaError::lock_poisoned("snapshots read"))?;

        let mut history: Vec<PlayerSeasonOverallSnapshot> = snapshots
            .values()
            .filter(|s| s.organization_id == organization_id && s.player_id == player_id)
            .cloned()
            .collect();
        history.sort_by_key(|s| s.recorded_at);

        Ok(history)
    }

    fn snapshot_count(&self) -> Result<usize> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| PeladaError::lock_poisoned("snapshots read"))?;

        Ok(snapshots.len())
    }
}
