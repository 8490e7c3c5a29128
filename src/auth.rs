//! Super-admin authorization
//!
//! Privileged operations take an `AdminCapability`, which can only be obtained
//! by passing the `SuperAdminPolicy`. Handlers authorize once and hand the
//! capability down instead of re-checking a global helper.

use crate::error::{PeladaError, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Already-authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    /// Per-user super-admin flag stored on the account
    #[serde(default)]
    pub is_super_admin: bool,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            is_super_admin: false,
        }
    }

    pub fn super_admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_super_admin: true,
        }
    }
}

/// Proof that the holder passed the super-admin check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCapability {
    granted_to: UserId,
}

impl AdminCapability {
    pub fn granted_to(&self) -> UserId {
        self.granted_to
    }
}

/// Super-admin check: configured allow-list or per-user flag
#[derive(Debug, Clone, Default)]
pub struct SuperAdminPolicy {
    allow_list: HashSet<UserId>,
}

impl SuperAdminPolicy {
    pub fn new<I: IntoIterator<Item = UserId>>(allow_list: I) -> Self {
        Self {
            allow_list: allow_list.into_iter().collect(),
        }
    }

    pub fn is_super_admin(&self, actor: &Actor) -> bool {
        actor.is_super_admin || self.allow_list.contains(&actor.user_id)
    }

    /// Grant an `AdminCapability` or fail with `PeladaError::Forbidden`
    pub fn authorize(&self, actor: &Actor) -> Result<AdminCapability> {
        if self.is_super_admin(actor) {
            debug!("User {} authorized as super admin", actor.user_id);
            return Ok(AdminCapability {
                granted_to: actor.user_id,
            });
        }

        warn!("User {} denied super-admin operation", actor.user_id);
        Err(PeladaError::Forbidden {
            reason: format!("user {} is not a super admin", actor.user_id),
        }
        .into())
    }
}
