//! Article lifecycle: visibility-scoped reads, derived uniqueness key,
//! soft delete

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Actor, Article};
use crate::policy::{self, EntityKind, Operation};
use crate::repositories::ArticleStore;

use super::{bool_field, require_str, str_field, string_list_field};

/// Article lifecycle service
#[derive(Clone)]
pub struct ArticleService {
    store: Arc<dyn ArticleStore>,
}

impl ArticleService {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, data: &Map<String, Value>, actor: &Actor) -> ApiResult<Article> {
        let auth = actor.authenticated().ok_or(ApiError::Unauthorized)?;
        policy::screen(EntityKind::Article, Operation::Create, actor.access_tier(), data)?;

        let title = require_str(data, "title")?.to_string();
        let content = require_str(data, "content")?.to_string();

        let author_key = Article::derive_key(auth.id, &title);
        if self.store.find_by_author_key(&author_key).await?.is_some() {
            return Err(ApiError::Conflict("article title already in use".into()));
        }

        let now = Utc::now();
        let article = Article {
            id: Uuid::new_v4(),
            title,
            content,
            categories: string_list_field(data, "categories").unwrap_or_default(),
            tags: string_list_field(data, "tags").unwrap_or_default(),
            author_key,
            is_public: bool_field(data, "isPublic").unwrap_or(false),
            author_id: auth.id,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&article).await?;
        info!("Created article {} by {}", article.id, auth.id);
        Ok(article)
    }

    /// A non-public article is visible only to its author or an admin.
    pub async fn read(&self, id: Uuid, actor: &Actor) -> ApiResult<Article> {
        let article = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PreconditionFailed("article"))?;

        if !article.is_public && !(actor.owns(article.author_id) || actor.is_admin()) {
            return Err(ApiError::Forbidden);
        }
        Ok(article)
    }

    /// Admins see every active article; everyone else, authors included,
    /// sees public ones only.
    pub async fn list(&self, actor: &Actor) -> ApiResult<Vec<Article>> {
        Ok(self.store.list(!actor.is_admin()).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        data: &Map<String, Value>,
        actor: &Actor,
    ) -> ApiResult<Article> {
        let mut article = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PreconditionFailed("article"))?;

        if !(actor.owns(article.author_id) || actor.is_admin()) {
            return Err(ApiError::Forbidden);
        }
        policy::screen(EntityKind::Article, Operation::Update, actor.access_tier(), data)?;

        if let Some(title) = str_field(data, "title") {
            if title != article.title {
                // the derived key follows the title; re-check uniqueness,
                // excluding this row
                let key = Article::derive_key(article.author_id, title);
                if let Some(existing) = self.store.find_by_author_key(&key).await? {
                    if existing.id != article.id {
                        return Err(ApiError::Conflict("article title already in use".into()));
                    }
                }
                article.author_key = key;
            }
            article.title = title.to_string();
        }
        if let Some(content) = str_field(data, "content") {
            article.content = content.to_string();
        }
        if let Some(categories) = string_list_field(data, "categories") {
            article.categories = categories;
        }
        if let Some(tags) = string_list_field(data, "tags") {
            article.tags = tags;
        }
        if let Some(is_public) = bool_field(data, "isPublic") {
            article.is_public = is_public;
        }

        article.updated_at = Utc::now();
        self.store.update(&article).await?;
        Ok(article)
    }

    /// Soft delete, by the author or an admin.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> ApiResult<()> {
        let mut article = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PreconditionFailed("article"))?;

        if !(actor.owns(article.author_id) || actor.is_admin()) {
            return Err(ApiError::Forbidden);
        }

        let now = Utc::now();
        article.deleted_at = Some(now);
        article.updated_at = now;
        self.store.update(&article).await?;
        info!("Soft-deleted article {}", article.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PrivilegeTier, ResourceKind};
    use crate::models::AuthenticatedUser;
    use crate::repositories::memory::MemoryArticleStore;
    use serde_json::json;

    fn service() -> (ArticleService, MemoryArticleStore) {
        let store = MemoryArticleStore::default();
        (ArticleService::new(Arc::new(store.clone())), store)
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().expect("test body must be an object").clone()
    }

    fn author() -> Actor {
        Actor::User(AuthenticatedUser {
            id: Uuid::new_v4(),
            tier: PrivilegeTier::Normal,
            grants: vec![ResourceKind::Todo, ResourceKind::Article],
        })
    }

    fn admin() -> Actor {
        Actor::User(AuthenticatedUser {
            id: Uuid::new_v4(),
            tier: PrivilegeTier::Admin,
            grants: vec![],
        })
    }

    #[tokio::test]
    async fn create_requires_author_identity() {
        let (service, _) = service();
        let err = service
            .create(
                &body(json!({"title": "Hello", "content": "World"})),
                &Actor::Anonymous,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        let alice = author();
        let article = service
            .create(
                &body(json!({"title": "Hello", "content": "World", "tags": ["intro"]})),
                &alice,
            )
            .await
            .unwrap();
        assert_eq!(article.author_id, alice.id().unwrap());
        assert_eq!(
            article.author_key,
            format!("{}:Hello", alice.id().unwrap())
        );
        assert!(!article.is_public);
    }

    #[tokio::test]
    async fn duplicate_title_per_author_conflicts() {
        let (service, _) = service();
        let alice = author();
        let payload = body(json!({"title": "Hello", "content": "World"}));
        service.create(&payload, &alice).await.unwrap();

        let err = service.create(&payload, &alice).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // a different author may reuse the title
        assert!(service.create(&payload, &author()).await.is_ok());
    }

    #[tokio::test]
    async fn soft_deleted_article_releases_its_title() {
        let (service, _) = service();
        let alice = author();
        let payload = body(json!({"title": "Hello", "content": "World"}));
        let article = service.create(&payload, &alice).await.unwrap();

        service.delete(article.id, &alice).await.unwrap();
        assert!(service.create(&payload, &alice).await.is_ok());
    }

    #[tokio::test]
    async fn title_change_recomputes_the_derived_key() {
        let (service, _) = service();
        let alice = author();
        let first = service
            .create(&body(json!({"title": "First", "content": "x"})), &alice)
            .await
            .unwrap();
        service
            .create(&body(json!({"title": "Second", "content": "x"})), &alice)
            .await
            .unwrap();

        let err = service
            .update(first.id, &body(json!({"title": "Second"})), &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let updated = service
            .update(first.id, &body(json!({"title": "Third"})), &alice)
            .await
            .unwrap();
        assert_eq!(
            updated.author_key,
            format!("{}:Third", alice.id().unwrap())
        );

        // same title again is not a self-conflict
        let unchanged = service
            .update(first.id, &body(json!({"title": "Third", "isPublic": true})), &alice)
            .await
            .unwrap();
        assert!(unchanged.is_public);
    }

    #[tokio::test]
    async fn visibility_gates_private_articles() {
        let (service, _) = service();
        let alice = author();
        let article = service
            .create(&body(json!({"title": "Secret", "content": "x"})), &alice)
            .await
            .unwrap();

        assert!(service.read(article.id, &alice).await.is_ok());
        assert!(service.read(article.id, &admin()).await.is_ok());

        let err = service.read(article.id, &author()).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        let err = service.read(article.id, &Actor::Anonymous).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        service
            .update(article.id, &body(json!({"isPublic": true})), &alice)
            .await
            .unwrap();
        assert!(service.read(article.id, &Actor::Anonymous).await.is_ok());
    }

    #[tokio::test]
    async fn listing_filters_to_public_for_non_admins() {
        let (service, _) = service();
        let alice = author();
        service
            .create(
                &body(json!({"title": "Public", "content": "x", "isPublic": true})),
                &alice,
            )
            .await
            .unwrap();
        service
            .create(&body(json!({"title": "Private", "content": "x"})), &alice)
            .await
            .unwrap();

        let anonymous = service.list(&Actor::Anonymous).await.unwrap();
        assert_eq!(anonymous.len(), 1);
        assert_eq!(anonymous[0].title, "Public");

        // even the author's own listing filters to public
        let own = service.list(&alice).await.unwrap();
        assert_eq!(own.len(), 1);

        let all = service.list(&admin()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_require_author_or_admin() {
        let (service, store) = service();
        let alice = author();
        let article = service
            .create(&body(json!({"title": "Hello", "content": "World"})), &alice)
            .await
            .unwrap();

        let err = service
            .update(article.id, &body(json!({"content": "hijack"})), &author())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let err = service.delete(article.id, &author()).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        // author identity fields are never settable
        let err = service
            .update(article.id, &body(json!({"authorId": "someone"})), &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ForbiddenField(f) if f == "authorId"));

        service.delete(article.id, &admin()).await.unwrap();
        // soft delete keeps the row but hides it
        assert!(
            store
                .rows
                .lock()
                .await
                .get(&article.id)
                .unwrap()
                .deleted_at
                .is_some()
        );
        let err = service.read(article.id, &alice).await.unwrap_err();
        assert!(matches!(err, ApiError::PreconditionFailed("article")));
    }
}
