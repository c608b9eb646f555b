//! Article repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::Article;

use super::{ArticleStore, StoreResult, map_db_err};

/// PostgreSQL-backed article store
#[derive(Clone)]
pub struct ArticleRepository {
    pool: PgPool,
}

impl ArticleRepository {
    /// Create a new article repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ARTICLE_COLUMNS: &str = "id, title, content, categories, tags, author_key, is_public, \
     author_id, deleted_at, created_at, updated_at";

fn row_to_article(row: &PgRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        categories: row.try_get("categories")?,
        tags: row.try_get("tags")?,
        author_key: row.try_get("author_key")?,
        is_public: row.try_get("is_public")?,
        author_id: row.try_get("author_id")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ArticleStore for ArticleRepository {
    async fn insert(&self, article: &Article) -> StoreResult<()> {
        info!("Creating article {} by author {}", article.id, article.author_id);

        sqlx::query(
            r#"
            INSERT INTO articles (id, title, content, categories, tags, author_key,
                                  is_public, author_id, deleted_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.categories)
        .bind(&article.tags)
        .bind(&article.author_key)
        .bind(article.is_public)
        .bind(article.author_id)
        .bind(article.deleted_at)
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "article"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "article"))?;

        match row {
            Some(row) => Ok(Some(row_to_article(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_author_key(&self, key: &str) -> StoreResult<Option<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE author_key = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "article"))?;

        match row {
            Some(row) => Ok(Some(row_to_article(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, public_only: bool) -> StoreResult<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE deleted_at IS NULL AND (is_public OR NOT $1) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(public_only)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "article"))?;

        rows.iter()
            .map(|row| row_to_article(row).map_err(Into::into))
            .collect()
    }

    async fn update(&self, article: &Article) -> StoreResult<()> {
        info!("Updating article {}", article.id);

        sqlx::query(
            r#"
            UPDATE articles
            SET title = $2, content = $3, categories = $4, tags = $5, author_key = $6,
                is_public = $7, deleted_at = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.categories)
        .bind(&article.tags)
        .bind(&article.author_key)
        .bind(article.is_public)
        .bind(article.deleted_at)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "article"))?;

        Ok(())
    }
}
