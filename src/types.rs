//! Common types used throughout the pelada service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PeladaError;

/// Unique identifier for organizations
pub type OrganizationId = u64;

/// Unique identifier for players
pub type PlayerId = u64;

/// Unique identifier for authenticated users
pub type UserId = u64;

/// Unique identifier for tournaments
pub type TournamentId = u64;

/// Unique identifier for teams
pub type TeamId = u64;

/// Unique identifier for matches
pub type MatchId = u64;

/// Unique identifier for seasons
pub type SeasonId = Uuid;

/// Playing position of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[serde(alias = "Goleiro")]
    Goalkeeper,
    #[serde(alias = "Defesa")]
    Defender,
    #[serde(alias = "Meio")]
    Midfielder,
    #[serde(alias = "Ataque")]
    Striker,
}

impl Position {
    /// Parse a free-text position label as entered in the frontend forms
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "goleiro" | "goalkeeper" | "gk" => Some(Position::Goalkeeper),
            "defesa" | "defender" | "def" => Some(Position::Defender),
            "meio" | "midfielder" | "mid" => Some(Position::Midfielder),
            "ataque" | "striker" | "atk" => Some(Position::Striker),
            _ => None,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Goalkeeper => write!(f, "Goalkeeper"),
            Position::Defender => write!(f, "Defender"),
            Position::Midfielder => write!(f, "Midfielder"),
            Position::Striker => write!(f, "Striker"),
        }
    }
}

/// Organization-scoped skill values of a player, all on the 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAttributes {
    pub speed: u8,
    pub finishing: u8,
    pub passing: u8,
    pub dribbling: u8,
    pub defense: u8,
    pub physical: u8,
    #[serde(default = "default_sportsmanship")]
    pub sportsmanship: u8,
}

fn default_sportsmanship() -> u8 {
    100
}

impl PlayerAttributes {
    /// Attributes with every skill set to `value` and full sportsmanship
    pub fn uniform(value: u8) -> Self {
        Self {
            speed: value,
            finishing: value,
            passing: value,
            dribbling: value,
            defense: value,
            physical: value,
            sportsmanship: default_sportsmanship(),
        }
    }

    /// Convert 0-5 star values from the UI into the 0-100 scale
    pub fn from_star_scale(stars: [u8; 6], sportsmanship_stars: Option<u8>) -> Self {
        let scale = |v: u8| v.min(5) * 20;
        Self {
            speed: scale(stars[0]),
            finishing: scale(stars[1]),
            passing: scale(stars[2]),
            dribbling: scale(stars[3]),
            defense: scale(stars[4]),
            physical: scale(stars[5]),
            sportsmanship: sportsmanship_stars.map(scale).unwrap_or(default_sportsmanship()),
        }
    }

    /// Copy with every field clamped into [0, 100]
    pub fn clamped(self) -> Self {
        Self {
            speed: self.speed.min(100),
            finishing: self.finishing.min(100),
            passing: self.passing.min(100),
            dribbling: self.dribbling.min(100),
            defense: self.defense.min(100),
            physical: self.physical.min(100),
            sportsmanship: self.sportsmanship.min(100),
        }
    }
}

impl Default for PlayerAttributes {
    fn default() -> Self {
        Self::uniform(60)
    }
}

/// Position classification used to pick a weighting row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionProfile {
    #[serde(default)]
    pub is_goalkeeper: bool,
    #[serde(default, deserialize_with = "deserialize_position_labels")]
    pub positions: Vec<Position>,
}

/// Free-text labels go through `Position::from_label`; unknown ones are dropped
fn deserialize_position_labels<'de, D>(deserializer: D) -> Result<Vec<Position>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let labels = Vec::<String>::deserialize(deserializer)?;
    Ok(labels
        .iter()
        .filter_map(|label| Position::from_label(label))
        .collect())
}

impl PositionProfile {
    pub fn goalkeeper() -> Self {
        Self {
            is_goalkeeper: true,
            positions: vec![Position::Goalkeeper],
        }
    }

    pub fn outfield(positions: Vec<Position>) -> Self {
        Self {
            is_goalkeeper: false,
            positions,
        }
    }

    /// Build a profile from free-text labels, ignoring anything unrecognised
    pub fn from_labels<S: AsRef<str>>(is_goalkeeper: bool, labels: &[S]) -> Self {
        Self {
            is_goalkeeper,
            positions: labels
                .iter()
                .filter_map(|label| Position::from_label(label.as_ref()))
                .collect(),
        }
    }
}

/// Longest season window an organization may configure
pub const MAX_SEASON_DURATION_DAYS: u32 = 3650;

/// Per-organization season configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    #[serde(default)]
    pub seasons_enabled: bool,
    #[serde(default)]
    pub season_duration_days: Option<u32>,
}

impl OrganizationSettings {
    pub fn with_seasons(duration_days: u32) -> Self {
        Self {
            seasons_enabled: true,
            season_duration_days: Some(duration_days),
        }
    }

    /// Duration in days when seasons are in effect for this organization
    pub fn effective_duration_days(&self) -> Option<u32> {
        if !self.seasons_enabled {
            return None;
        }
        self.season_duration_days.filter(|days| *days > 0)
    }

    /// Reject enabled seasons without a usable duration
    pub fn validate(&self) -> Result<(), PeladaError> {
        if self.seasons_enabled && self.effective_duration_days().is_none() {
            return Err(PeladaError::InvalidSettings {
                reason: "season_duration_days must be at least 1 when seasons are enabled"
                    .to_string(),
            });
        }
        if let Some(days) = self.season_duration_days {
            if days > MAX_SEASON_DURATION_DAYS {
                return Err(PeladaError::InvalidSettings {
                    reason: format!(
                        "season_duration_days must be at most {}",
                        MAX_SEASON_DURATION_DAYS
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A bounded time window grouping rating snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Season {
    /// Whether `now` has reached the end of this season
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }
}

/// Reference to the window a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SeasonRef {
    Season(SeasonId),
    AllTime,
}

const ALL_TIME: &str = "all_time";
const SEASON_PREFIX: &str = "season:";

impl std::fmt::Display for SeasonRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonRef::Season(id) => write!(f, "{}{}", SEASON_PREFIX, id),
            SeasonRef::AllTime => write!(f, "{}", ALL_TIME),
        }
    }
}

impl std::str::FromStr for SeasonRef {
    type Err = PeladaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_TIME {
            return Ok(SeasonRef::AllTime);
        }
        s.strip_prefix(SEASON_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(SeasonRef::Season)
            .ok_or_else(|| PeladaError::InvalidRequest {
                reason: format!("Invalid season reference: {}", s),
            })
    }
}

impl TryFrom<String> for SeasonRef {
    type Error = PeladaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeasonRef> for String {
    fn from(value: SeasonRef) -> Self {
        value.to_string()
    }
}

/// Overall rating of a player recorded for one season window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeasonOverallSnapshot {
    pub organization_id: OrganizationId,
    pub player_id: PlayerId,
    pub season_ref: SeasonRef,
    pub overall: u8,
    pub recorded_at: DateTime<Utc>,
}

/// Lifecycle state of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Open,
    Finished,
}

/// A tournament match as seen by the standings builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub team_a: Option<TeamId>,
    pub team_b: Option<TeamId>,
    pub status: MatchStatus,
    #[serde(default)]
    pub goals_a: Option<u32>,
    #[serde(default)]
    pub goals_b: Option<u32>,
}

impl MatchRecord {
    /// Both teams and the final score, when the match counts for standings
    pub fn final_score(&self) -> Option<((TeamId, u32), (TeamId, u32))> {
        if self.status != MatchStatus::Finished {
            return None;
        }
        Some((
            (self.team_a?, self.goals_a?),
            (self.team_b?, self.goals_b?),
        ))
    }
}

/// Tournament-scoped ranking row of a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub team_id: TeamId,
    pub tournament_id: TournamentId,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: u32,
}

impl StandingRow {
    pub fn empty(team_id: TeamId, tournament_id: TournamentId) -> Self {
        Self {
            team_id,
            tournament_id,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }
}
