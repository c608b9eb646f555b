//! User repository for database operations

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use crate::constants::{CreationOrigin, PrivilegeTier, ResourceKind};
use crate::models::User;

use super::{StoreResult, UserLookup, UserStore, map_db_err};

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, username, password_hash, unique_identifier, activated, \
     privilege_tier, creation_origin, granted_resources, deleted_at, created_at, updated_at";

fn row_to_user(row: &PgRow) -> Result<User> {
    let tier: i16 = row.try_get("privilege_tier")?;
    let origin: i16 = row.try_get("creation_origin")?;
    let grants: Vec<i16> = row.try_get("granted_resources")?;
    let granted_resources = grants
        .into_iter()
        .map(|g| ResourceKind::try_from(g).map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()
        .context("invalid granted_resources value")?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        unique_identifier: row.try_get("unique_identifier")?,
        activated: row.try_get("activated")?,
        privilege_tier: PrivilegeTier::try_from(tier)
            .map_err(anyhow::Error::msg)
            .context("invalid privilege_tier value")?,
        creation_origin: CreationOrigin::try_from(origin)
            .map_err(anyhow::Error::msg)
            .context("invalid creation_origin value")?,
        granted_resources,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn lookup_clause(key: &UserLookup) -> &'static str {
    match key {
        UserLookup::ById(_) => "id = $1",
        UserLookup::ByUsername(_) => "LOWER(username) = LOWER($1)",
        UserLookup::ByEmail(_) => "LOWER(email) = LOWER($1)",
    }
}

impl UserRepository {
    async fn find_where(&self, key: &UserLookup, active_only: bool) -> StoreResult<Option<User>> {
        let scope = if active_only {
            " AND deleted_at IS NULL"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {}{scope}",
            lookup_clause(key)
        );

        let query = sqlx::query(&sql);
        let query = match key {
            UserLookup::ById(id) => query.bind(*id),
            UserLookup::ByUsername(name) => query.bind(name.clone()),
            UserLookup::ByEmail(email) => query.bind(email.clone()),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "user"))?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        info!("Creating new user: {}", user.id);

        let grants: Vec<i16> = user.granted_resources.iter().map(|g| i16::from(*g)).collect();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, unique_identifier,
                               activated, privilege_tier, creation_origin, granted_resources,
                               deleted_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.unique_identifier)
        .bind(user.activated)
        .bind(i16::from(user.privilege_tier))
        .bind(i16::from(user.creation_origin))
        .bind(&grants)
        .bind(user.deleted_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "user"))?;

        Ok(())
    }

    async fn find(&self, key: &UserLookup) -> StoreResult<Option<User>> {
        self.find_where(key, true).await
    }

    async fn find_any(&self, key: &UserLookup) -> StoreResult<Option<User>> {
        self.find_where(key, false).await
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        info!("Updating user: {}", user.id);

        let grants: Vec<i16> = user.granted_resources.iter().map(|g| i16::from(*g)).collect();

        sqlx::query(
            r#"
            UPDATE users
            SET email = $2, username = $3, password_hash = $4, activated = $5,
                privilege_tier = $6, granted_resources = $7, deleted_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.activated)
        .bind(i16::from(user.privilege_tier))
        .bind(&grants)
        .bind(user.deleted_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "user"))?;

        Ok(())
    }
}
