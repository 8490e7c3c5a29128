//! Pivot attribute storage interface and implementations
//!
//! Attributes are scoped to an organization membership: the same player can
//! carry different values in each organization they belong to.

use crate::error::{PeladaError, Result};
use crate::types::{OrganizationId, PlayerAttributes, PlayerId, PositionProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Composite key of a membership
pub type MembershipKey = (OrganizationId, PlayerId);

/// Storage entry for a player's attributes inside one organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeEntry {
    pub organization_id: OrganizationId,
    pub player_id: PlayerId,
    /// `None` until attributes are entered for this membership
    pub attributes: Option<PlayerAttributes>,
    pub profile: PositionProfile,
    pub updated_at: DateTime<Utc>,
    pub joined_at: DateTime<Utc>,
}

impl AttributeEntry {
    /// Create an entry for a new member without stored attributes
    pub fn new(
        organization_id: OrganizationId,
        player_id: PlayerId,
        profile: PositionProfile,
    ) -> Self {
        let now = Utc::now();
        Self {
            organization_id,
            player_id,
            attributes: None,
            profile,
            updated_at: now,
            joined_at: now,
        }
    }

    /// Replace the stored attributes
    pub fn update_attributes(&mut self, attributes: PlayerAttributes, profile: PositionProfile) {
        self.attributes = Some(attributes.clamped());
        self.profile = profile;
        self.updated_at = Utc::now();
    }

    pub fn key(&self) -> MembershipKey {
        (self.organization_id, self.player_id)
    }
}

/// Trait for pivot attribute storage operations
pub trait AttributeStorage: Send + Sync {
    /// Get a membership entry
    fn get_attributes(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<Option<AttributeEntry>>;

    /// Store or update a membership entry
    fn store_attributes(&self, entry: AttributeEntry) -> Result<()>;

    /// All current members of an organization, ordered by player id
    fn members(&self, organization_id: OrganizationId) -> Result<Vec<AttributeEntry>>;

    /// Remove a membership, returning whether it existed
    fn remove_member(&self, organization_id: OrganizationId, player_id: PlayerId)
        -> Result<bool>;

    /// Total number of memberships
    fn member_count(&self) -> Result<usize>;
}

/// In-memory attribute storage implementation
#[derive(Debug, Default)]
pub struct InMemoryAttributeStorage {
    entries: RwLock<HashMap<MembershipKey, AttributeEntry>>,
}

impl InMemoryAttributeStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttributeStorage for InMemoryAttributeStorage {
    fn get_attributes(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<Option<AttributeEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PeladaError::lock_poisoned("attributes read"))?;

        Ok(entries.get(&(organization_id, player_id)).cloned())
    }

    fn store_attributes(&self, entry: AttributeEntry) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PeladaError::lock_poisoned("attributes write"))?;

        entries.insert(entry.key(), entry);
        Ok(())
    }

    fn members(&self, organization_id: OrganizationId) -> Result<Vec<AttributeEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PeladaError::lock_poisoned("attributes read"))?;

        let mut members: Vec<AttributeEntry> = entries
            .values()
            .filter(|entry| entry.organization_id == organization_id)
            .cloned()
            .collect();
        members.sort_by_key(|entry| entry.player_id);

        Ok(members)
    }

    fn remove_member(
        &self,
        organization_id: OrganizationId,
        player_id: PlayerId,
    ) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PeladaError::lock_poisoned("attributes write"))?;

        Ok(entries.remove(&(organization_id, player_id)).is_some())
    }

    fn member_count(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PeladaError::lock_poisoned("attributes read"))?;

        Ok(entries.len())
    }
}
