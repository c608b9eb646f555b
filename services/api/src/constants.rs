//! Shared enumerations and limits
//!
//! Entities, validators, and policies all depend on this module; it depends
//! on nothing else in the crate.

use serde::{Deserialize, Serialize};

/// Privilege tier stored on a user row and carried by request actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum PrivilegeTier {
    Normal,
    Admin,
    Editor,
}

impl TryFrom<i16> for PrivilegeTier {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PrivilegeTier::Normal),
            1 => Ok(PrivilegeTier::Admin),
            2 => Ok(PrivilegeTier::Editor),
            other => Err(format!("unknown privilege tier: {other}")),
        }
    }
}

impl From<PrivilegeTier> for i16 {
    fn from(tier: PrivilegeTier) -> i16 {
        match tier {
            PrivilegeTier::Normal => 0,
            PrivilegeTier::Admin => 1,
            PrivilegeTier::Editor => 2,
        }
    }
}

/// Resource kinds a user can hold a grant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum ResourceKind {
    Todo,
    Article,
}

impl TryFrom<i16> for ResourceKind {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ResourceKind::Todo),
            1 => Ok(ResourceKind::Article),
            other => Err(format!("unknown resource kind: {other}")),
        }
    }
}

impl From<ResourceKind> for i16 {
    fn from(kind: ResourceKind) -> i16 {
        match kind {
            ResourceKind::Todo => 0,
            ResourceKind::Article => 1,
        }
    }
}

/// How a user row came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum CreationOrigin {
    SelfRegistered,
    ByAdmin,
}

impl TryFrom<i16> for CreationOrigin {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CreationOrigin::SelfRegistered),
            1 => Ok(CreationOrigin::ByAdmin),
            other => Err(format!("unknown creation origin: {other}")),
        }
    }
}

impl From<CreationOrigin> for i16 {
    fn from(origin: CreationOrigin) -> i16 {
        match origin {
            CreationOrigin::SelfRegistered => 0,
            CreationOrigin::ByAdmin => 1,
        }
    }
}

/// Usernames that would collide with routing or administration.
pub const RESERVED_USERNAMES: [&str; 4] = ["activateaccount", "resetpassword", "admin", "root"];

/// Upper bound for free-text fields (title, content, scope).
pub const TEXT_FIELD_MAX: usize = 254;

/// Password length bounds.
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 28;
