//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pelada::config::AppConfig;
use pelada::metrics::MetricsCollector;
use pelada::rating::InMemoryAttributeStorage;
use pelada::season::{InMemorySeasonStore, ManualClock};
use pelada::service::AppState;
use pelada::types::{MatchRecord, MatchStatus, TeamId, TournamentId};
use std::sync::Arc;

/// User id granted super-admin rights in every fixture config
pub const ADMIN_USER: u64 = 1;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

/// Application wired to in-memory stores and a clock the test controls
pub struct TestSystem {
    pub app: Arc<AppState>,
    pub clock: Arc<ManualClock>,
    pub seasons: Arc<InMemorySeasonStore>,
    pub metrics: Arc<MetricsCollector>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.admin.super_admin_ids = vec![ADMIN_USER];
    config
}

pub async fn create_test_system() -> TestSystem {
    create_test_system_with(test_config()).await
}

pub async fn create_test_system_with(config: AppConfig) -> TestSystem {
    let clock = Arc::new(ManualClock::new(start_time()));
    let seasons = Arc::new(InMemorySeasonStore::new());
    let metrics = Arc::new(MetricsCollector::new().unwrap());

    let mut app = AppState::with_components(
        config,
        Arc::new(InMemoryAttributeStorage::new()),
        seasons.clone(),
        clock.clone(),
        metrics.clone(),
    )
    .unwrap();
    app.start().await.unwrap();

    TestSystem {
        app: Arc::new(app),
        clock,
        seasons,
        metrics,
    }
}

/// A finished match between two teams
pub fn finished(
    id: u64,
    tournament_id: TournamentId,
    team_a: TeamId,
    team_b: TeamId,
    goals: (u32, u32),
) -> MatchRecord {
    MatchRecord {
        id,
        tournament_id,
        team_a: Some(team_a),
        team_b: Some(team_b),
        status: MatchStatus::Finished,
        goals_a: Some(goals.0),
        goals_b: Some(goals.1),
    }
}

/// A match that has not been played yet
pub fn open(id: u64, tournament_id: TournamentId, team_a: TeamId, team_b: TeamId) -> MatchRecord {
    MatchRecord {
        id,
        tournament_id,
        team_a: Some(team_a),
        team_b: Some(team_b),
        status: MatchStatus::Open,
        goals_a: None,
        goals_b: None,
    }
}
