//! Season configuration

use crate::types::OrganizationSettings;
use serde::{Deserialize, Serialize};

/// Season behavior for organizations and conflict handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonSettings {
    /// Whether organizations that were never configured run seasons
    pub enabled_by_default: bool,
    /// Season length for organizations that were never configured
    pub default_duration_days: u32,
    /// How many times a write re-runs season sync after losing a race
    pub conflict_retries: u32,
}

impl Default for SeasonSettings {
    fn default() -> Self {
        Self {
            enabled_by_default: false,
            default_duration_days: 30,
            conflict_retries: 1,
        }
    }
}

impl SeasonSettings {
    /// Settings assumed for an organization without stored settings
    pub fn default_organization_settings(&self) -> OrganizationSettings {
        OrganizationSettings {
            seasons_enabled: self.enabled_by_default,
            season_duration_days: Some(self.default_duration_days),
        }
    }
}
