//! In-memory store doubles backing the service tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Article, Todo, TodoFilter, User};

use super::{ArticleStore, StoreResult, TodoStore, UserLookup, UserStore};

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    pub rows: Arc<Mutex<HashMap<Uuid, User>>>,
}

fn matches_key(user: &User, key: &UserLookup) -> bool {
    match key {
        UserLookup::ById(id) => user.id == *id,
        UserLookup::ByUsername(name) => user.username.eq_ignore_ascii_case(name),
        UserLookup::ByEmail(email) => user.email.eq_ignore_ascii_case(email),
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        self.rows.lock().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn find(&self, key: &UserLookup) -> StoreResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .find(|u| !u.is_deleted() && matches_key(u, key))
            .cloned())
    }

    async fn find_any(&self, key: &UserLookup) -> StoreResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .find(|u| matches_key(u, key))
            .cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        self.rows.lock().await.insert(user.id, user.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryTodoStore {
    pub rows: Arc<Mutex<HashMap<Uuid, Todo>>>,
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn insert(&self, todo: &Todo) -> StoreResult<()> {
        self.rows.lock().await.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Todo>> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid, filter: &TodoFilter) -> StoreResult<Vec<Todo>> {
        let mut todos: Vec<Todo> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|t| t.owner_id == owner_id)
            .filter(|t| filter.completed.is_none_or(|c| t.completed == c))
            .cloned()
            .collect();
        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    async fn update(&self, todo: &Todo) -> StoreResult<()> {
        self.rows.lock().await.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.rows.lock().await.remove(&id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryArticleStore {
    pub rows: Arc<Mutex<HashMap<Uuid, Article>>>,
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn insert(&self, article: &Article) -> StoreResult<()> {
        self.rows.lock().await.insert(article.id, article.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Article>> {
        Ok(self
            .rows
            .lock()
            .await
            .get(&id)
            .filter(|a| a.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_author_key(&self, key: &str) -> StoreResult<Option<Article>> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .find(|a| a.deleted_at.is_none() && a.author_key == key)
            .cloned())
    }

    async fn list(&self, public_only: bool) -> StoreResult<Vec<Article>> {
        let mut articles: Vec<Article> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|a| a.deleted_at.is_none() && (a.is_public || !public_only))
            .cloned()
            .collect();
        articles.sort_by_key(|a| std::cmp::Reverse(a.created_at));
        Ok(articles)
    }

    async fn update(&self, article: &Article) -> StoreResult<()> {
        self.rows.lock().await.insert(article.id, article.clone());
        Ok(())
    }
}
