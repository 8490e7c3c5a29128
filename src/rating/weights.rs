//! Position-dependent weighting of player attributes
//!
//! Weights are kept in half-units so the weighted average can be rounded with
//! exact integer arithmetic.

use crate::types::{PlayerAttributes, Position, PositionProfile};
use serde::{Deserialize, Serialize};

/// Weighting row selected for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingRole {
    Goalkeeper,
    Striker,
    Midfielder,
    Defender,
}

impl RatingRole {
    /// Pick the weighting row for a position profile.
    ///
    /// The goalkeeper flag overrides any listed position. Outfield players are
    /// matched striker first, then midfielder, then defender. Returns `None`
    /// when no position is listed.
    pub fn resolve(profile: &PositionProfile) -> Option<Self> {
        if profile.is_goalkeeper || profile.positions.contains(&Position::Goalkeeper) {
            return Some(RatingRole::Goalkeeper);
        }

        [
            (Position::Striker, RatingRole::Striker),
            (Position::Midfielder, RatingRole::Midfielder),
            (Position::Defender, RatingRole::Defender),
        ]
        .into_iter()
        .find(|(position, _)| profile.positions.contains(position))
        .map(|(_, role)| role)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RatingRole::Goalkeeper => "goalkeeper",
            RatingRole::Striker => "striker",
            RatingRole::Midfielder => "midfielder",
            RatingRole::Defender => "defender",
        }
    }
}

impl std::fmt::Display for RatingRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attribute weights of one role, in half-units (2 == weight 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleWeights {
    pub speed: u32,
    pub finishing: u32,
    pub passing: u32,
    pub dribbling: u32,
    pub defense: u32,
    pub physical: u32,
    pub sportsmanship: u32,
    /// Divisor applied to the weighted sum, in whole units
    pub divisor: u32,
}

const GOALKEEPER: RoleWeights = RoleWeights {
    speed: 0,
    finishing: 0,
    passing: 2,
    dribbling: 0,
    defense: 2,
    physical: 0,
    sportsmanship: 2,
    divisor: 3,
};

const STRIKER: RoleWeights = RoleWeights {
    speed: 4,
    finishing: 6,
    passing: 2,
    dribbling: 4,
    defense: 1,
    physical: 4,
    sportsmanship: 1,
    divisor: 11,
};

const MIDFIELDER: RoleWeights = RoleWeights {
    speed: 2,
    finishing: 2,
    passing: 6,
    dribbling: 4,
    defense: 4,
    physical: 4,
    sportsmanship: 1,
    divisor: 11,
};

const DEFENDER: RoleWeights = RoleWeights {
    speed: 5,
    finishing: 1,
    passing: 4,
    dribbling: 1,
    defense: 6,
    physical: 6,
    sportsmanship: 1,
    divisor: 12,
};

impl RoleWeights {
    pub fn for_role(role: RatingRole) -> &'static RoleWeights {
        match role {
            RatingRole::Goalkeeper => &GOALKEEPER,
            RatingRole::Striker => &STRIKER,
            RatingRole::Midfielder => &MIDFIELDER,
            RatingRole::Defender => &DEFENDER,
        }
    }

    /// Weighted sum of the attributes in half-units
    pub fn weighted_half_units(&self, attrs: &PlayerAttributes) -> u32 {
        self.speed * u32::from(attrs.speed)
            + self.finishing * u32::from(attrs.finishing)
            + self.passing * u32::from(attrs.passing)
            + self.dribbling * u32::from(attrs.dribbling)
            + self.defense * u32::from(attrs.defense)
            + self.physical * u32::from(attrs.physical)
            + self.sportsmanship * u32::from(attrs.sportsmanship)
    }

    /// Weighted average rounded half-up, clamped to 100
    pub fn apply(&self, attrs: &PlayerAttributes) -> u8 {
        let half_units = self.weighted_half_units(attrs);
        // floor(sum / (2 * divisor) + 1/2)
        let rounded = (half_units + self.divisor) / (2 * self.divisor);
        rounded.min(100) as u8
    }
}
