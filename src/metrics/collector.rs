//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the pelada service: rating
//! computations, season transitions, snapshot writes and standings builds.

use crate::rating::weights::RatingRole;
use crate::season::store::SnapshotWrite;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the pelada service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Rating-related metrics
    rating_metrics: RatingMetrics,

    /// Season-related metrics
    season_metrics: SeasonMetrics,

    /// Standings-related metrics
    standings_metrics: StandingsMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,

    /// HTTP requests handled by route and status class
    pub http_requests_total: IntCounterVec,

    /// HTTP request durations by route
    pub http_request_duration: HistogramVec,
}

/// Rating-related metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Overall computations by weighting role
    pub overall_computations_total: IntCounterVec,

    /// Distribution of computed overalls
    pub overall_distribution: Histogram,

    /// Peer votes cast
    pub votes_cast_total: IntCounter,
}

/// Season-related metrics
#[derive(Clone)]
pub struct SeasonMetrics {
    /// Seasons opened by kind (first, rollover)
    pub seasons_opened_total: IntCounterVec,

    /// Active-season uniqueness conflicts
    pub season_conflicts_total: IntCounter,

    /// Snapshot writes by outcome (created, updated)
    pub snapshots_written_total: IntCounterVec,
}

/// Standings-related metrics
#[derive(Clone)]
pub struct StandingsMetrics {
    /// Standings tables built
    pub standings_builds_total: IntCounter,

    /// Matches folded into standings
    pub matches_folded_total: IntCounter,

    /// Matches skipped (open, incomplete or foreign)
    pub matches_skipped_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let season_metrics = SeasonMetrics::new(&registry)?;
        let standings_metrics = StandingsMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            rating_metrics,
            season_metrics,
            standings_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Get season metrics
    pub fn season(&self) -> &SeasonMetrics {
        &self.season_metrics
    }

    /// Get standings metrics
    pub fn standings(&self) -> &StandingsMetrics {
        &self.standings_metrics
    }

    /// Record an overall computation
    pub fn record_overall(&self, role: Option<RatingRole>, overall: u8) {
        let role_str = role.map(|r| r.as_str()).unwrap_or("unknown");

        self.rating_metrics
            .overall_computations_total
            .with_label_values(&[role_str])
            .inc();

        self.rating_metrics
            .overall_distribution
            .observe(f64::from(overall));
    }

    /// Record a peer vote
    pub fn record_vote(&self) {
        self.rating_metrics.votes_cast_total.inc();
    }

    /// Record a season being opened
    pub fn record_season_opened(&self, rollover: bool) {
        let kind = if rollover { "rollover" } else { "first" };
        self.season_metrics
            .seasons_opened_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record an active-season conflict
    pub fn record_season_conflict(&self) {
        self.season_metrics.season_conflicts_total.inc();
    }

    /// Record a snapshot upsert
    pub fn record_snapshot(&self, write: SnapshotWrite) {
        let outcome = match write {
            SnapshotWrite::Created => "created",
            SnapshotWrite::Updated => "updated",
        };
        self.season_metrics
            .snapshots_written_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record a standings build
    pub fn record_standings_build(&self, folded: usize, skipped: usize) {
        self.standings_metrics.standings_builds_total.inc();
        self.standings_metrics
            .matches_folded_total
            .inc_by(folded as u64);
        self.standings_metrics
            .matches_skipped_total
            .inc_by(skipped as u64);
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, route: &str, status: u16, duration: Duration) {
        let status_class = format!("{}xx", status / 100);

        self.service_metrics
            .http_requests_total
            .with_label_values(&[route, &status_class])
            .inc();

        self.service_metrics
            .http_request_duration
            .with_label_values(&[route])
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds = IntGauge::new("pelada_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "pelada_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("pelada_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("pelada_http_requests_total", "Total HTTP requests handled"),
            &["route", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "pelada_http_request_duration_seconds",
                "HTTP request duration",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["route"],
        )?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
            http_requests_total,
            http_request_duration,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let overall_computations_total = IntCounterVec::new(
            Opts::new(
                "pelada_overall_computations_total",
                "Overall ratings computed",
            ),
            &["role"],
        )?;
        registry.register(Box::new(overall_computations_total.clone()))?;

        let overall_distribution = Histogram::with_opts(
            HistogramOpts::new("pelada_overall_distribution", "Computed overall ratings")
                .buckets(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]),
        )?;
        registry.register(Box::new(overall_distribution.clone()))?;

        let votes_cast_total = IntCounter::new("pelada_votes_cast_total", "Peer votes cast")?;
        registry.register(Box::new(votes_cast_total.clone()))?;

        Ok(Self {
            overall_computations_total,
            overall_distribution,
            votes_cast_total,
        })
    }
}

impl SeasonMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let seasons_opened_total = IntCounterVec::new(
            Opts::new("pelada_seasons_opened_total", "Seasons opened"),
            &["kind"],
        )?;
        registry.register(Box::new(seasons_opened_total.clone()))?;

        let season_conflicts_total = IntCounter::new(
            "pelada_season_conflicts_total",
            "Active season uniqueness conflicts",
        )?;
        registry.register(Box::new(season_conflicts_total.clone()))?;

        let snapshots_written_total = IntCounterVec::new(
            Opts::new(
                "pelada_snapshots_written_total",
                "Overall snapshots written",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(snapshots_written_total.clone()))?;

        Ok(Self {
            seasons_opened_total,
            season_conflicts_total,
            snapshots_written_total,
        })
    }
}

impl StandingsMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let standings_builds_total =
            IntCounter::new("pelada_standings_builds_total", "Standings tables built")?;
        registry.register(Box::new(standings_builds_total.clone()))?;

        let matches_folded_total = IntCounter::new(
            "pelada_matches_folded_total",
            "Finished matches folded into standings",
        )?;
        registry.register(Box::new(matches_folded_total.clone()))?;

        let matches_skipped_total = IntCounter::new(
            "pelada_matches_skipped_total",
            "Matches skipped while building standings",
        )?;
        registry.register(Box::new(matches_skipped_total.clone()))?;

        Ok(Self {
            standings_builds_total,
            matches_folded_total,
            matches_skipped_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
