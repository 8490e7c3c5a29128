//! Rating configuration

use crate::types::PlayerAttributes;
use serde::{Deserialize, Serialize};

/// Defaults applied to members without entered attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Value used for every skill of a member without attributes
    pub default_attribute: u8,
    /// Sportsmanship assumed when none was entered
    pub default_sportsmanship: u8,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            default_attribute: 60,
            default_sportsmanship: 100,
        }
    }
}

impl RatingSettings {
    pub fn default_attributes(&self) -> PlayerAttributes {
        PlayerAttributes {
            sportsmanship: self.default_sportsmanship,
            ..PlayerAttributes::uniform(self.default_attribute)
        }
    }
}
