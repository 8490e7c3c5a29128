//! Overall rating aggregation for organization members
//!
//! This module provides the position-weighted overall formula, the pivot
//! attribute storage interface, and peer vote aggregation.

pub mod calculator;
pub mod storage;
pub mod votes;
pub mod weights;

// Re-export commonly used types
pub use calculator::{calculate_overall, OverallCalculator, OverallResult, PositionWeightedCalculator};
pub use storage::{AttributeEntry, AttributeStorage, InMemoryAttributeStorage};
pub use votes::{PlayerVote, VoteBook};
pub use weights::{RatingRole, RoleWeights};
