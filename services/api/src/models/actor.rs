//! The identity and privilege context behind a request
//!
//! An actor is derived from the bearer credential by the middleware and
//! lives for a single request; it is never persisted.

use uuid::Uuid;

use crate::constants::{PrivilegeTier, ResourceKind};

/// A verified, activated account making a request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub tier: PrivilegeTier,
    pub grants: Vec<ResourceKind>,
}

/// The caller of an operation, possibly absent.
#[derive(Debug, Clone)]
pub enum Actor {
    Anonymous,
    User(AuthenticatedUser),
}

/// Access tier used by the field policy resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Anonymous,
    Owner,
    Admin,
}

impl Actor {
    /// The authenticated identity, if any.
    pub fn authenticated(&self) -> Option<&AuthenticatedUser> {
        match self {
            Actor::Anonymous => None,
            Actor::User(user) => Some(user),
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.authenticated().map(|u| u.id)
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self.authenticated(),
            Some(user) if user.tier == PrivilegeTier::Admin
        )
    }

    /// Whether this actor is the given row owner.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.id() == Some(owner_id)
    }

    pub fn has_grant(&self, kind: ResourceKind) -> bool {
        matches!(
            self.authenticated(),
            Some(user) if user.grants.contains(&kind)
        )
    }

    /// Tier the field policy resolves against.
    pub fn access_tier(&self) -> AccessTier {
        match self.authenticated() {
            None => AccessTier::Anonymous,
            Some(user) if user.tier == PrivilegeTier::Admin => AccessTier::Admin,
            Some(_) => AccessTier::Owner,
        }
    }
}
