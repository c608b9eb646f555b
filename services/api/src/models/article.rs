//! Article entity

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Article row. `author_key` is the derived uniqueness key
/// `"{author_id}:{title}"`, recomputed whenever the title changes.
/// Articles are soft-deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub author_key: String,
    pub is_public: bool,
    pub author_id: Uuid,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Uniqueness key for one author+title pair.
    pub fn derive_key(author_id: Uuid, title: &str) -> String {
        format!("{author_id}:{title}")
    }
}
