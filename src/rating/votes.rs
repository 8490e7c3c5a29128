//! Peer-voted attribute ratings
//!
//! Members rate each other on the 0-5 star scale. The aggregated mean of all
//! votes for a player becomes that player's pivot attributes.

use crate::error::{PeladaError, Result};
use crate::types::{OrganizationId, PlayerAttributes, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Highest value a single vote can carry
pub const MAX_STARS: u8 = 5;

/// A single member's rating of another member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerVote {
    pub organization_id: OrganizationId,
    pub voter_id: PlayerId,
    pub player_id: PlayerId,
    pub speed: u8,
    pub finishing: u8,
    pub passing: u8,
    pub dribbling: u8,
    pub defense: u8,
    pub physical: u8,
    #[serde(default)]
    pub sportsmanship: Option<u8>,
}

impl PlayerVote {
    fn skills(&self) -> [u8; 6] {
        [
            self.speed,
            self.finishing,
            self.passing,
            self.dribbling,
            self.defense,
            self.physical,
        ]
    }

    /// Reject self-votes and values outside the star scale
    pub fn validate(&self) -> std::result::Result<(), PeladaError> {
        if self.voter_id == self.player_id {
            return Err(PeladaError::InvalidVote {
                reason: "players cannot vote for themselves".to_string(),
            });
        }

        let out_of_range = self
            .skills()
            .into_iter()
            .chain(self.sportsmanship)
            .any(|value| value > MAX_STARS);
        if out_of_range {
            return Err(PeladaError::InvalidVote {
                reason: format!("vote values must be between 0 and {}", MAX_STARS),
            });
        }

        Ok(())
    }
}

type VoteKey = (OrganizationId, PlayerId, PlayerId);

/// Vote registry keeping one vote per (organization, voter, player)
#[derive(Debug, Default)]
pub struct VoteBook {
    votes: RwLock<HashMap<VoteKey, PlayerVote>>,
}

impl VoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote, replacing any earlier vote by the same voter.
    /// Returns true when a previous vote was replaced.
    pub fn cast(&self, vote: PlayerVote) -> Result<bool> {
        vote.validate()?;

        let mut votes = self
            .votes
            .write()
            .map_err(|_| PeladaError::lock_poisoned("votes write"))?;

        let key = (vote.organization_id, vote.voter_id, vote.player_id);
        Ok(votes.insert(key, vote).is_some())
    }

    /// Number of votes received by a player in an organization
    pub fn vote_count(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<usize> {
        Ok(self.votes_for(organization_id, player_id)?.len())
    }

    /// Mean of all votes for a player, scaled to 0-100.
    /// Returns `None` when nobody has voted for the player yet.
    pub fn aggregate(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<Option<PlayerAttributes>> {
        let votes = self.votes_for(organization_id, player_id)?;
        if votes.is_empty() {
            return Ok(None);
        }

        let mut totals = [0u32; 6];
        for vote in &votes {
            for (total, value) in totals.iter_mut().zip(vote.skills()) {
                *total += u32::from(value);
            }
        }
        let count = votes.len() as u32;
        let scaled = |total: u32| scale_mean(total, count);

        let sportsmanship_votes: Vec<u8> = votes.iter().filter_map(|v| v.sportsmanship).collect();
        let sportsmanship = if sportsmanship_votes.is_empty() {
            100
        } else {
            let total: u32 = sportsmanship_votes.iter().map(|v| u32::from(*v)).sum();
            scale_mean(total, sportsmanship_votes.len() as u32)
        };

        Ok(Some(PlayerAttributes {
            speed: scaled(totals[0]),
            finishing: scaled(totals[1]),
            passing: scaled(totals[2]),
            dribbling: scaled(totals[3]),
            defense: scaled(totals[4]),
            physical: scaled(totals[5]),
            sportsmanship,
        }))
    }

    fn votes_for(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerVote>> {
        let votes = self
            .votes
            .read()
            .map_err(|_| PeladaError::lock_poisoned("votes read"))?;

        Ok(votes
            .iter()
            .filter(|((org, _, player), _)| *org == organization_id && *player == player_id)
            .map(|(_, vote)| vote.clone())
            .collect())
    }
}

/// round(total / count * 20), half-up, in integer arithmetic
fn scale_mean(total: u32, count: u32) -> u8 {
    let scaled = (total * 40 + count) / (2 * count);
    scaled.min(100) as u8
}
