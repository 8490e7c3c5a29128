//! Season lifecycle and overall snapshots
//!
//! The tracker resolves which season window a rating write belongs to, opening
//! or rolling over seasons as needed, and records the player's overall under
//! that window.

use crate::error::{PeladaError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{AttributeStorage, OverallCalculator};
use crate::season::clock::Clock;
use crate::season::store::{SeasonStore, SeasonTransition, SnapshotWrite};
use crate::types::{
    OrganizationId, OrganizationSettings, PlayerId, PlayerSeasonOverallSnapshot, Season,
    SeasonRef,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

fn season_end(
    organization_id: OrganizationId,
    starts_at: DateTime<Utc>,
    duration: Duration,
) -> Result<DateTime<Utc>> {
    starts_at.checked_add_signed(duration).ok_or_else(|| {
        PeladaError::InvalidSettings {
            reason: format!(
                "season of {} days starting {} is out of range for organization {}",
                duration.num_days(),
                starts_at,
                organization_id
            ),
        }
        .into()
    })
}

/// Outcome of snapshotting every member of an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    pub organization_id: OrganizationId,
    pub season_ref: SeasonRef,
    pub players: usize,
    pub created: usize,
    pub updated: usize,
}

/// Keeps each organization's active season current and writes snapshots
pub struct SeasonTracker {
    store: Arc<dyn SeasonStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsCollector>,
}

impl SeasonTracker {
    pub fn new(
        store: Arc<dyn SeasonStore>,
        clock: Arc<dyn Clock>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            clock,
            metrics,
        }
    }

    pub fn store(&self) -> &Arc<dyn SeasonStore> {
        &self.store
    }

    /// Resolve the season reference for a write happening now.
    ///
    /// Opens the first season when none is active, and rolls over every
    /// season whose end has been reached. Each successor starts exactly at
    /// its predecessor's end.
    pub fn sync_active_season(
        &self,
        organization_id: OrganizationId,
        settings: &OrganizationSettings,
    ) -> Result<SeasonRef> {
        let Some(days) = settings.effective_duration_days() else {
            return Ok(SeasonRef::AllTime);
        };
        let duration = Duration::days(i64::from(days));
        let now = self.clock.now();

        let mut season = match self.store.active_season(organization_id)? {
            Some(season) => season,
            None => {
                let season = self.open(
                    organization_id,
                    SeasonTransition::First {
                        starts_at: now,
                        ends_at: season_end(organization_id, now, duration)?,
                    },
                )?;
                info!(
                    "Opened {} for organization {} ({} - {})",
                    season.name, organization_id, season.starts_at, season.ends_at
                );
                self.metrics.record_season_opened(false);
                season
            }
        };

        while season.has_ended(now) {
            let next = self.open(
                organization_id,
                SeasonTransition::Rollover {
                    closing: season.id,
                    starts_at: season.ends_at,
                    ends_at: season_end(organization_id, season.ends_at, duration)?,
                },
            )?;
            info!(
                "Rolled over organization {} from {} to {}",
                organization_id, season.name, next.name
            );
            self.metrics.record_season_opened(true);
            season = next;
        }

        Ok(SeasonRef::Season(season.id))
    }

    /// Create or overwrite the snapshot for (organization, player, season)
    pub fn upsert_player_overall_snapshot(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
        season_ref: SeasonRef,
        overall: u8,
    ) -> Result<SnapshotWrite> {
        let write = self.store.upsert_snapshot(PlayerSeasonOverallSnapshot {
            organization_id,
            player_id,
            season_ref,
            overall,
            recorded_at: self.clock.now(),
        })?;

        debug!(
            "Snapshot {:?} for player {} in organization {} ({}): {}",
            write, player_id, organization_id, season_ref, overall
        );
        self.metrics.record_snapshot(write);
        Ok(write)
    }

    /// Sync the active season, then snapshot the player's overall under it
    pub fn record_player_overall(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
        settings: &OrganizationSettings,
        overall: u8,
    ) -> Result<SeasonRef> {
        let season_ref = self.sync_active_season(organization_id, settings)?;
        self.upsert_player_overall_snapshot(organization_id, player_id, season_ref, overall)?;
        Ok(season_ref)
    }

    /// Snapshot every current member's overall.
    ///
    /// Members without stored attributes are rated with the calculator's
    /// default attributes.
    pub fn bootstrap_organization(
        &self,
        organization_id: OrganizationId,
        settings: &OrganizationSettings,
        attributes: &dyn AttributeStorage,
        calculator: &dyn OverallCalculator,
    ) -> Result<BootstrapReport> {
        let season_ref = self.sync_active_season(organization_id, settings)?;
        let members = attributes.members(organization_id)?;

        let mut report = BootstrapReport {
            organization_id,
            season_ref,
            players: members.len(),
            created: 0,
            updated: 0,
        };

        for member in members {
            let attrs = member
                .attributes
                .unwrap_or_else(|| calculator.default_attributes());
            let result = calculator.calculate(&attrs, &member.profile);
            self.metrics.record_overall(result.role, result.overall);

            match self.upsert_player_overall_snapshot(
                organization_id,
                member.player_id,
                season_ref,
                result.overall,
            )? {
                SnapshotWrite::Created => report.created += 1,
                SnapshotWrite::Updated => report.updated += 1,
            }
        }

        info!(
            "Bootstrapped organization {}: {} players under {} ({} created, {} updated)",
            organization_id, report.players, season_ref, report.created, report.updated
        );
        Ok(report)
    }

    fn open(&self, organization_id: OrganizationId, transition: SeasonTransition) -> Result<Season> {
        self.store
            .open_season(organization_id, transition)
            .map_err(|e| {
                if PeladaError::is_season_conflict(&e) {
                    warn!(
                        "Concurrent season transition detected for organization {}",
                        organization_id
                    );
                    self.metrics.record_season_conflict();
                }
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{AttributeEntry, InMemoryAttributeStorage, PositionWeightedCalculator};
    use crate::season::clock::{ManualClock, MockClock};
    use crate::season::store::InMemorySeasonStore;
    use crate::types::{PlayerAttributes, Position, PositionProfile};
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn tracker_with(
        clock: Arc<dyn Clock>,
    ) -> (SeasonTracker, Arc<InMemorySeasonStore>, Arc<MetricsCollector>) {
        let store = Arc::new(InMemorySeasonStore::new());
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let tracker = SeasonTracker::new(store.clone(), clock, metrics.clone());
        (tracker, store, metrics)
    }

    #[test]
    fn test_disabled_seasons_use_all_time() {
        let mut clock = MockClock::new();
        clock.expect_now().never();
        let (tracker, store, _) = tracker_with(Arc::new(clock));

        let season_ref = tracker
            .sync_active_season(1, &OrganizationSettings::default())
            .unwrap();
        assert_eq!(season_ref, SeasonRef::AllTime);

        // enabled but no duration configured
        let settings = OrganizationSettings {
            seasons_enabled: true,
            season_duration_days: None,
        };
        assert_eq!(tracker.sync_active_season(1, &settings).unwrap(), SeasonRef::AllTime);
        assert!(store.seasons(1).unwrap().is_empty());
    }

    #[test]
    fn test_first_season_starts_now() {
        let mut clock = MockClock::new();
        clock.expect_now().return_const(start());
        let (tracker, store, metrics) = tracker_with(Arc::new(clock));

        let season_ref = tracker
            .sync_active_season(1, &OrganizationSettings::with_seasons(30))
            .unwrap();

        let season = store.active_season(1).unwrap().unwrap();
        assert_eq!(season_ref, SeasonRef::Season(season.id));
        assert_eq!(season.starts_at, start());
        assert_eq!(season.ends_at, start() + Duration::days(30));
        assert_eq!(season.name, "Season 1");
        assert_eq!(
            metrics
                .season()
                .seasons_opened_total
                .with_label_values(&["first"])
                .get(),
            1
        );
    }

    #[test]
    fn test_sync_is_idempotent_within_window() {
        let clock = Arc::new(ManualClock::new(start()));
        let (tracker, store, _) = tracker_with(clock.clone());
        let settings = OrganizationSettings::with_seasons(30);

        let first = tracker.sync_active_season(1, &settings).unwrap();
        clock.advance(Duration::days(29));
        let second = tracker.sync_active_season(1, &settings).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.seasons(1).unwrap().len(), 1);
    }

    #[test]
    fn test_rollover_at_exact_boundary() {
        let clock = Arc::new(ManualClock::new(start()));
        let (tracker, store, metrics) = tracker_with(clock.clone());
        let settings = OrganizationSettings::with_seasons(7);

        tracker.sync_active_season(1, &settings).unwrap();
        let old = store.active_season(1).unwrap().unwrap();

        clock.set(old.ends_at);
        let season_ref = tracker.sync_active_season(1, &settings).unwrap();

        let new = store.active_season(1).unwrap().unwrap();
        assert_eq!(season_ref, SeasonRef::Season(new.id));
        assert_ne!(new.id, old.id);
        assert_eq!(new.starts_at, old.ends_at);
        assert_eq!(new.name, "Season 2");
        assert_eq!(
            metrics
                .season()
                .seasons_opened_total
                .with_label_values(&["rollover"])
                .get(),
            1
        );
    }

    #[test]
    fn test_catch_up_over_several_seasons() {
        let clock = Arc::new(ManualClock::new(start()));
        let (tracker, store, _) = tracker_with(clock.clone());
        let settings = OrganizationSettings::with_seasons(10);

        tracker.sync_active_season(1, &settings).unwrap();
        clock.advance(Duration::days(35));
        tracker.sync_active_season(1, &settings).unwrap();

        let seasons = store.seasons(1).unwrap();
        assert_eq!(seasons.len(), 4);
        for pair in seasons.windows(2) {
            assert_eq!(pair[1].starts_at, pair[0].ends_at);
        }

        let active = store.active_season(1).unwrap().unwrap();
        assert_eq!(active.name, "Season 4");
        assert!(active.starts_at <= clock.now() && clock.now() < active.ends_at);
    }

    #[test]
    fn test_snapshot_upsert_is_idempotent() {
        let clock = Arc::new(ManualClock::new(start()));
        let (tracker, store, _) = tracker_with(clock);
        let settings = OrganizationSettings::with_seasons(30);

        let season_ref = tracker.record_player_overall(1, 10, &settings, 55).unwrap();
        let again = tracker.record_player_overall(1, 10, &settings, 61).unwrap();
        assert_eq!(season_ref, again);

        assert_eq!(store.snapshot_count().unwrap(), 1);
        let stored = store.snapshot(1, 10, season_ref).unwrap().unwrap();
        assert_eq!(stored.overall, 61);
    }

    #[test]
    fn test_new_season_gets_its_own_snapshot() {
        let clock = Arc::new(ManualClock::new(start()));
        let (tracker, store, _) = tracker_with(clock.clone());
        let settings = OrganizationSettings::with_seasons(30);

        let first = tracker.record_player_overall(1, 10, &settings, 55).unwrap();
        clock.advance(Duration::days(31));
        let second = tracker.record_player_overall(1, 10, &settings, 70).unwrap();

        assert_ne!(first, second);
        let history = store.player_snapshots(1, 10).unwrap();
        let overalls: Vec<u8> = history.iter().map(|s| s.overall).collect();
        assert_eq!(overalls, vec![55, 70]);
    }

    #[test]
    fn test_conflict_is_propagated_and_counted() {
        let clock = Arc::new(ManualClock::new(start()));
        let (tracker, store, metrics) = tracker_with(clock.clone());
        let settings = OrganizationSettings::with_seasons(5);

        tracker.sync_active_season(1, &settings).unwrap();
        let stale = store.active_season(1).unwrap().unwrap();

        // another writer rolls the season over first
        store
            .open_season(
                1,
                SeasonTransition::Rollover {
                    closing: stale.id,
                    starts_at: stale.ends_at,
                    ends_at: stale.ends_at + Duration::days(5),
                },
            )
            .unwrap();

        let err = tracker
            .open(
                1,
                SeasonTransition::Rollover {
                    closing: stale.id,
                    starts_at: stale.ends_at,
                    ends_at: stale.ends_at + Duration::days(5),
                },
            )
            .unwrap_err();
        assert!(PeladaError::is_season_conflict(&err));
        assert_eq!(metrics.season().season_conflicts_total.get(), 1);
        assert_eq!(
            store
                .seasons(1)
                .unwrap()
                .iter()
                .filter(|s| s.is_active)
                .count(),
            1
        );
    }

    #[test]
    fn test_out_of_range_duration_is_an_error() {
        let clock = Arc::new(ManualClock::new(start()));
        let (tracker, store, _) = tracker_with(clock);

        // unvalidated settings must not overflow the season window
        let err = tracker
            .sync_active_season(1, &OrganizationSettings::with_seasons(200_000_000))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PeladaError>(),
            Some(PeladaError::InvalidSettings { .. })
        ));
        assert!(store.seasons(1).unwrap().is_empty());
    }

    #[test]
    fn test_bootstrap_snapshots_every_member() {
        let clock = Arc::new(ManualClock::new(start()));
        let (tracker, store, _) = tracker_with(clock);
        let attributes = InMemoryAttributeStorage::new();
        let calculator = PositionWeightedCalculator::default();

        let mut rated = AttributeEntry::new(7, 1, PositionProfile::goalkeeper());
        rated.update_attributes(PlayerAttributes::uniform(90), PositionProfile::goalkeeper());
        attributes.store_attributes(rated).unwrap();
        attributes
            .store_attributes(AttributeEntry::new(
                7,
                2,
                PositionProfile::outfield(vec![Position::Midfielder]),
            ))
            .unwrap();

        let settings = OrganizationSettings::default();
        let report = tracker
            .bootstrap_organization(7, &settings, &attributes, &calculator)
            .unwrap();
        assert_eq!(report.players, 2);
        assert_eq!(report.created, 2);
        assert_eq!(report.season_ref, SeasonRef::AllTime);

        // goalkeeper: (90 + 90 + 100) / 3 = 93.33
        assert_eq!(store.snapshot(7, 1, SeasonRef::AllTime).unwrap().unwrap().overall, 93);
        // midfielder on defaults: (60*11 + 50) / 11 = 64.5
        assert_eq!(store.snapshot(7, 2, SeasonRef::AllTime).unwrap().unwrap().overall, 65);

        let again = tracker
            .bootstrap_organization(7, &settings, &attributes, &calculator)
            .unwrap();
        assert_eq!(again.updated, 2);
        assert_eq!(store.snapshot_count().unwrap(), 2);
    }
}
