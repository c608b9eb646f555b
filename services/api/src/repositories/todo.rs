//! Todo repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{Todo, TodoFilter};

use super::{StoreResult, TodoStore, map_db_err};

/// PostgreSQL-backed todo store
#[derive(Clone)]
pub struct TodoRepository {
    pool: PgPool,
}

impl TodoRepository {
    /// Create a new todo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_todo(row: &PgRow) -> Result<Todo> {
    Ok(Todo {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        completed: row.try_get("completed")?,
        due_date: row.try_get("due_date")?,
        scope: row.try_get("scope")?,
        scope_date: row.try_get("scope_date")?,
        owner_id: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl TodoStore for TodoRepository {
    async fn insert(&self, todo: &Todo) -> StoreResult<()> {
        info!("Creating todo {} for owner {}", todo.id, todo.owner_id);

        sqlx::query(
            r#"
            INSERT INTO todos (id, title, content, completed, due_date, scope, scope_date,
                               owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(todo.id)
        .bind(&todo.title)
        .bind(&todo.content)
        .bind(todo.completed)
        .bind(&todo.due_date)
        .bind(&todo.scope)
        .bind(&todo.scope_date)
        .bind(todo.owner_id)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "todo"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Todo>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, completed, due_date, scope, scope_date,
                   owner_id, created_at, updated_at
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "todo"))?;

        match row {
            Some(row) => Ok(Some(row_to_todo(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_owner(&self, owner_id: Uuid, filter: &TodoFilter) -> StoreResult<Vec<Todo>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, completed, due_date, scope, scope_date,
                   owner_id, created_at, updated_at
            FROM todos
            WHERE owner_id = $1 AND ($2::BOOL IS NULL OR completed = $2)
            ORDER BY created_at
            "#,
        )
        .bind(owner_id)
        .bind(filter.completed)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "todo"))?;

        rows.iter()
            .map(|row| row_to_todo(row).map_err(Into::into))
            .collect()
    }

    async fn update(&self, todo: &Todo) -> StoreResult<()> {
        info!("Updating todo {}", todo.id);

        sqlx::query(
            r#"
            UPDATE todos
            SET title = $2, content = $3, completed = $4, due_date = $5,
                scope = $6, scope_date = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(todo.id)
        .bind(&todo.title)
        .bind(&todo.content)
        .bind(todo.completed)
        .bind(&todo.due_date)
        .bind(&todo.scope)
        .bind(&todo.scope_date)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "todo"))?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        info!("Deleting todo {}", id);

        sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "todo"))?;

        Ok(())
    }
}
