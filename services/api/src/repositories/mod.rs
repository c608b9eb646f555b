//! Storage collaborators
//!
//! Lifecycle services talk to these traits; the PostgreSQL implementations
//! live in the sibling modules and an in-memory double backs the service
//! tests.

pub mod article;
pub mod todo;
pub mod user;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Article, Todo, TodoFilter, User};

// Re-export for convenience
pub use article::ArticleRepository;
pub use todo::TodoRepository;
pub use user::UserRepository;

/// Storage failure surfaced to the lifecycle services.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("{0} already exists")]
    Conflict(String),

    /// Anything else: connectivity, bad rows, driver failures.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Closed set of user lookup keys. String keys match case-insensitively.
#[derive(Debug, Clone)]
pub enum UserLookup {
    ById(Uuid),
    ByUsername(String),
    ByEmail(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a fully formed row.
    async fn insert(&self, user: &User) -> StoreResult<()>;

    /// Find among active rows only.
    async fn find(&self, key: &UserLookup) -> StoreResult<Option<User>>;

    /// Find among all rows, soft-deleted included.
    async fn find_any(&self, key: &UserLookup) -> StoreResult<Option<User>>;

    /// Persist the mutable attributes of an existing row.
    async fn update(&self, user: &User) -> StoreResult<()>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert(&self, todo: &Todo) -> StoreResult<()>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Todo>>;

    /// List one owner's todos, optionally filtered by completion.
    async fn list_by_owner(&self, owner_id: Uuid, filter: &TodoFilter) -> StoreResult<Vec<Todo>>;

    async fn update(&self, todo: &Todo) -> StoreResult<()>;

    /// Hard delete.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn insert(&self, article: &Article) -> StoreResult<()>;

    /// Find among active rows only.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Article>>;

    /// Find an active row holding the derived author+title key.
    async fn find_by_author_key(&self, key: &str) -> StoreResult<Option<Article>>;

    /// List active rows; `public_only` hides private articles.
    async fn list(&self, public_only: bool) -> StoreResult<Vec<Article>>;

    /// Persist mutable attributes, including the soft-delete marker.
    async fn update(&self, article: &Article) -> StoreResult<()>;
}

/// Translate a driver error, reporting unique-index violations as conflicts.
pub(crate) fn map_db_err(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(what.to_string());
        }
    }
    StoreError::Unexpected(err.into())
}
