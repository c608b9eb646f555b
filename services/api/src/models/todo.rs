//! Todo entity

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Todo row. Date-like fields keep the validated ISO strings they arrived
/// with. Todos are owner-scoped and hard-deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub completed: bool,
    pub due_date: Option<String>,
    pub scope: Option<String>,
    pub scope_date: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing filter, ANDed with the ownership scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoFilter {
    pub completed: Option<bool>,
}
