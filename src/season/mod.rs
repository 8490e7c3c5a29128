//! Season windows and per-season overall snapshots

pub mod clock;
pub mod store;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{InMemorySeasonStore, SeasonStore, SeasonTransition, SnapshotWrite};
pub use tracker::{BootstrapReport, SeasonTracker};
