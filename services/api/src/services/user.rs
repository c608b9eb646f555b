//! User lifecycle: registration, projection, update, soft delete,
//! activation, and password reset

use std::sync::Arc;

use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::constants::{CreationOrigin, PrivilegeTier, ResourceKind};
use crate::error::{ApiError, ApiResult};
use crate::models::{Actor, PublicUserResponse, User, UserProjection, UserResponse};
use crate::notifier::Notifier;
use crate::policy::{self, EntityKind, Operation};
use crate::repositories::{UserLookup, UserStore};
use crate::validation::Rule;

use super::{bool_field, require_str, str_field};

/// User lifecycle service
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Register or (for admins) provision an account.
    ///
    /// The username defaults to the email when absent. Uniqueness of email
    /// and username is case-insensitive and covers soft-deleted rows, which
    /// keep their email reserved for activation continuity.
    pub async fn create(&self, data: &Map<String, Value>, actor: &Actor) -> ApiResult<User> {
        policy::screen(EntityKind::User, Operation::Create, actor.access_tier(), data)?;

        let email = require_str(data, "email")?.to_string();
        let password = require_str(data, "password")?;
        let username = str_field(data, "username").unwrap_or(&email).to_string();

        self.ensure_email_free(&email, None).await?;
        self.ensure_username_free(&username, None).await?;

        let is_admin = actor.is_admin();
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            username,
            password_hash: hash_password(password)?,
            unique_identifier: Uuid::new_v4(),
            activated: is_admin && bool_field(data, "activated").unwrap_or(false),
            privilege_tier: if is_admin {
                tier_field(data)?.unwrap_or(PrivilegeTier::Normal)
            } else {
                PrivilegeTier::Normal
            },
            creation_origin: if is_admin {
                CreationOrigin::ByAdmin
            } else {
                CreationOrigin::SelfRegistered
            },
            granted_resources: vec![ResourceKind::Todo, ResourceKind::Article],
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&user).await?;
        info!("Registered user {}", user.id);

        if !user.activated {
            self.notifier
                .send_activation(&user.email, user.unique_identifier)
                .await;
        }

        Ok(user)
    }

    /// Project an account for the given actor: owners and admins see the
    /// full row, everyone else the public subset.
    pub async fn read(&self, key: &UserLookup, actor: &Actor) -> ApiResult<UserProjection> {
        let user = self
            .store
            .find(key)
            .await?
            .ok_or(ApiError::PreconditionFailed("user"))?;

        if actor.owns(user.id) || actor.is_admin() {
            Ok(UserProjection::Full(UserResponse::from(&user)))
        } else {
            Ok(UserProjection::Public(PublicUserResponse::from(&user)))
        }
    }

    pub async fn update(
        &self,
        id: Uuid,
        data: &Map<String, Value>,
        actor: &Actor,
    ) -> ApiResult<User> {
        let mut user = self
            .store
            .find(&UserLookup::ById(id))
            .await?
            .ok_or(ApiError::PreconditionFailed("user"))?;

        if !(actor.owns(user.id) || actor.is_admin()) {
            return Err(ApiError::Forbidden);
        }
        policy::screen(EntityKind::User, Operation::Update, actor.access_tier(), data)?;

        if let Some(email) = str_field(data, "email") {
            if !email.eq_ignore_ascii_case(&user.email) {
                self.ensure_email_free(email, Some(user.id)).await?;
            }
            user.email = email.to_string();
        }
        if let Some(username) = str_field(data, "username") {
            if !username.eq_ignore_ascii_case(&user.username) {
                self.ensure_username_free(username, Some(user.id)).await?;
            }
            user.username = username.to_string();
        }
        if let Some(password) = str_field(data, "password") {
            user.password_hash = hash_password(password)?;
        }
        if actor.is_admin() {
            if let Some(activated) = bool_field(data, "activated") {
                user.activated = activated;
            }
            if let Some(tier) = tier_field(data)? {
                user.privilege_tier = tier;
            }
        }

        user.updated_at = Utc::now();
        self.store.update(&user).await?;
        Ok(user)
    }

    /// Soft delete. The row stays behind, deactivated and with its username
    /// overwritten by the email, so activation can later restore it.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> ApiResult<()> {
        let mut user = self
            .store
            .find(&UserLookup::ById(id))
            .await?
            .ok_or(ApiError::PreconditionFailed("user"))?;

        if !(actor.owns(user.id) || actor.is_admin()) {
            return Err(ApiError::Forbidden);
        }

        let now = Utc::now();
        user.activated = false;
        user.username = user.email.clone();
        user.deleted_at = Some(now);
        user.updated_at = now;
        self.store.update(&user).await?;
        info!("Deactivated user {}", user.id);

        self.notifier
            .send_restoration(&user.email, user.unique_identifier)
            .await;

        Ok(())
    }

    /// Activate an account matched by email + identifier. A soft-deleted row
    /// is restored first, which is what makes repeated activation attempts
    /// survive an account deletion.
    pub async fn activate_account(&self, email: &str, unique_identifier: Uuid) -> ApiResult<User> {
        let mut user = self
            .store
            .find_any(&UserLookup::ByEmail(email.to_string()))
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if user.unique_identifier != unique_identifier {
            return Err(ApiError::Unauthorized);
        }
        if user.activated {
            return Err(ApiError::Conflict("account already activated".into()));
        }

        if user.is_deleted() {
            user.deleted_at = None;
        }
        user.activated = true;
        user.updated_at = Utc::now();
        self.store.update(&user).await?;
        info!("Activated user {}", user.id);

        Ok(user)
    }

    /// Replace the password of an account matched by email + identifier.
    /// Activation state is not required.
    pub async fn reset_password(
        &self,
        email: &str,
        unique_identifier: Uuid,
        new_password: &str,
    ) -> ApiResult<()> {
        if !Rule::Password.check(&Value::String(new_password.to_string())) {
            return Err(ApiError::Validation("invalid value for field 'password'".into()));
        }

        let mut user = self
            .store
            .find_any(&UserLookup::ByEmail(email.to_string()))
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if user.unique_identifier != unique_identifier {
            return Err(ApiError::Unauthorized);
        }

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.store.update(&user).await?;
        info!("Password reset for user {}", user.id);

        Ok(())
    }

    /// Verify login credentials, distinguishing unknown accounts and bad
    /// passwords (unauthorized) from unactivated accounts (forbidden).
    pub async fn authenticate(&self, login: &str, password: &str) -> ApiResult<User> {
        let user = match self
            .store
            .find(&UserLookup::ByUsername(login.to_string()))
            .await?
        {
            Some(user) => Some(user),
            None => {
                self.store
                    .find(&UserLookup::ByEmail(login.to_string()))
                    .await?
            }
        }
        .ok_or(ApiError::Unauthorized)?;

        if !verify_password(&user.password_hash, password) {
            return Err(ApiError::Unauthorized);
        }
        if !user.activated {
            return Err(ApiError::Forbidden);
        }

        Ok(user)
    }

    /// Fetch an account that must be live and activated, as token refresh
    /// requires.
    pub async fn require_active(&self, id: Uuid) -> ApiResult<User> {
        let user = self
            .store
            .find(&UserLookup::ById(id))
            .await?
            .ok_or(ApiError::Unauthorized)?;
        if !user.activated {
            return Err(ApiError::Unauthorized);
        }
        Ok(user)
    }

    async fn ensure_email_free(&self, email: &str, exclude: Option<Uuid>) -> ApiResult<()> {
        let existing = self
            .store
            .find_any(&UserLookup::ByEmail(email.to_string()))
            .await?;
        if let Some(existing) = existing {
            if Some(existing.id) != exclude {
                return Err(ApiError::Conflict("email already in use".into()));
            }
        }
        Ok(())
    }

    async fn ensure_username_free(&self, username: &str, exclude: Option<Uuid>) -> ApiResult<()> {
        let existing = self
            .store
            .find_any(&UserLookup::ByUsername(username.to_string()))
            .await?;
        if let Some(existing) = existing {
            if Some(existing.id) != exclude {
                return Err(ApiError::Conflict("username already in use".into()));
            }
        }
        Ok(())
    }
}

fn tier_field(body: &Map<String, Value>) -> ApiResult<Option<PrivilegeTier>> {
    match body.get("type").and_then(Value::as_i64) {
        Some(n) => i16::try_from(n)
            .ok()
            .and_then(|n| PrivilegeTier::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| ApiError::Validation("invalid value for field 'type'".into())),
        None => Ok(None),
    }
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Unexpected(anyhow!("failed to hash password: {e}")))
}

pub(crate) fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
