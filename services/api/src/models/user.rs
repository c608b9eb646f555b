//! User entity and its projections

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::constants::{CreationOrigin, PrivilegeTier, ResourceKind};

/// User row. The password hash and the activation identifier never leave
/// the service layer; neither type serializes them.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    /// Opaque token matched by activation and password-reset flows. Immutable.
    pub unique_identifier: Uuid,
    pub activated: bool,
    pub privilege_tier: PrivilegeTier,
    pub creation_origin: CreationOrigin,
    pub granted_resources: Vec<ResourceKind>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Full projection, returned to the account owner or an admin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub activated: bool,
    #[serde(rename = "type")]
    pub privilege_tier: PrivilegeTier,
    pub creation_origin: CreationOrigin,
    pub granted_resources: Vec<ResourceKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            activated: user.activated,
            privilege_tier: user.privilege_tier,
            creation_origin: user.creation_origin,
            granted_resources: user.granted_resources.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Reduced projection for everyone else.
#[derive(Debug, Serialize)]
pub struct PublicUserResponse {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for PublicUserResponse {
    fn from(user: &User) -> Self {
        PublicUserResponse {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// What a read returns depends on who is asking.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserProjection {
    Full(UserResponse),
    Public(PublicUserResponse),
}
