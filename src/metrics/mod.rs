//! Metrics for the pelada service
//!
//! Prometheus counters for rating computations, season transitions, snapshot
//! writes and standings builds. They are exposed by the HTTP API at `/metrics`.

pub mod collector;

pub use collector::{
    MetricsCollector, MetricsTimer, RatingMetrics, SeasonMetrics, ServiceMetrics,
    StandingsMetrics,
};
