//! Overall rating calculator trait and implementations
//!
//! This module defines the interface used by the service layer to turn a
//! player's attributes into a single 0-100 overall score.

use crate::rating::weights::{RatingRole, RoleWeights};
use crate::types::{PlayerAttributes, PositionProfile};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Result of an overall calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallResult {
    pub overall: u8,
    /// Weighting row used, `None` when the zero-fallback applied
    pub role: Option<RatingRole>,
}

/// Compute a player's overall with the position weighting table.
///
/// Players without any recognised position get an overall of 0. That case is
/// logged so callers can spot profiles that need fixing.
pub fn calculate_overall(attrs: &PlayerAttributes, profile: &PositionProfile) -> OverallResult {
    let attrs = attrs.clamped();
    match RatingRole::resolve(profile) {
        Some(role) => OverallResult {
            overall: RoleWeights::for_role(role).apply(&attrs),
            role: Some(role),
        },
        None => {
            warn!(
                "No position recognised in profile {:?}, overall falls back to 0",
                profile
            );
            OverallResult {
                overall: 0,
                role: None,
            }
        }
    }
}

/// Trait for computing overall ratings
pub trait OverallCalculator: Send + Sync {
    /// Compute the overall for a set of attributes and a position profile
    fn calculate(&self, attrs: &PlayerAttributes, profile: &PositionProfile) -> OverallResult;

    /// Attributes assumed for players without stored values
    fn default_attributes(&self) -> PlayerAttributes;
}

/// Production calculator using the position weighting table
#[derive(Debug, Clone)]
pub struct PositionWeightedCalculator {
    default_attributes: PlayerAttributes,
}

impl PositionWeightedCalculator {
    pub fn new(default_attributes: PlayerAttributes) -> Self {
        Self { default_attributes }
    }
}

impl Default for PositionWeightedCalculator {
    fn default() -> Self {
        Self::new(PlayerAttributes::default())
    }
}

impl OverallCalculator for PositionWeightedCalculator {
    fn calculate(&self, attrs: &PlayerAttributes, profile: &PositionProfile) -> OverallResult {
        calculate_overall(attrs, profile)
    }

    fn default_attributes(&self) -> PlayerAttributes {
        self.default_attributes
    }
}

/// Mock calculator for testing
#[derive(Debug, Default)]
pub struct MockOverallCalculator {
    calls: std::sync::Mutex<Vec<(PlayerAttributes, PositionProfile)>>,
    fixed_overall: std::sync::RwLock<Option<u8>>,
}

impl MockOverallCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `overall` for every calculation
    pub fn set_fixed_overall(&self, overall: u8) {
        if let Ok(mut fixed) = self.fixed_overall.write() {
            *fixed = Some(overall);
        }
    }

    /// Get all calculation calls made (for testing)
    pub fn get_calls(&self) -> Vec<(PlayerAttributes, PositionProfile)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl OverallCalculator for MockOverallCalculator {
    fn calculate(&self, attrs: &PlayerAttributes, profile: &PositionProfile) -> OverallResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((*attrs, profile.clone()));
        }

        if let Ok(fixed) = self.fixed_overall.read() {
            if let Some(overall) = *fixed {
                return OverallResult {
                    overall,
                    role: RatingRole::resolve(profile),
                };
            }
        }

        calculate_overall(attrs, profile)
    }

    fn default_attributes(&self) -> PlayerAttributes {
        PlayerAttributes::default()
    }
}
