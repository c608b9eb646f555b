//! Todo lifecycle: owner-scoped CRUD gated by the TODO resource grant

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::constants::ResourceKind;
use crate::error::{ApiError, ApiResult};
use crate::models::{Actor, Todo, TodoFilter};
use crate::policy::{self, EntityKind, Operation};
use crate::repositories::TodoStore;

use super::{apply_nullable, bool_field, require_str, str_field};

/// Todo lifecycle service
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, data: &Map<String, Value>, actor: &Actor) -> ApiResult<Todo> {
        let auth = actor.authenticated().ok_or(ApiError::Unauthorized)?;
        if !actor.has_grant(ResourceKind::Todo) {
            return Err(ApiError::Forbidden);
        }
        policy::screen(EntityKind::Todo, Operation::Create, actor.access_tier(), data)?;

        let title = require_str(data, "title")?.to_string();

        let now = Utc::now();
        let todo = Todo {
            id: Uuid::new_v4(),
            title,
            content: str_field(data, "content").map(str::to_string),
            completed: bool_field(data, "completed").unwrap_or(false),
            due_date: str_field(data, "dueDate").map(str::to_string),
            scope: str_field(data, "scope").map(str::to_string),
            scope_date: str_field(data, "scopeDate").map(str::to_string),
            owner_id: auth.id,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&todo).await?;
        info!("Created todo {} for {}", todo.id, auth.id);
        Ok(todo)
    }

    pub async fn read(&self, id: Uuid, actor: &Actor) -> ApiResult<Todo> {
        actor.authenticated().ok_or(ApiError::Unauthorized)?;
        let todo = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PreconditionFailed("todo"))?;

        if !(actor.owns(todo.owner_id) || actor.is_admin()) {
            return Err(ApiError::Forbidden);
        }
        Ok(todo)
    }

    /// List the requesting owner's todos; the filter is ANDed with the
    /// ownership scope.
    pub async fn list(&self, filter: &TodoFilter, actor: &Actor) -> ApiResult<Vec<Todo>> {
        let auth = actor.authenticated().ok_or(ApiError::Unauthorized)?;
        Ok(self.store.list_by_owner(auth.id, filter).await?)
    }

    /// Update is strictly owner-only; there is no admin override.
    pub async fn update(&self, id: Uuid, data: &Map<String, Value>, actor: &Actor) -> ApiResult<Todo> {
        actor.authenticated().ok_or(ApiError::Unauthorized)?;
        let mut todo = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PreconditionFailed("todo"))?;

        if !actor.owns(todo.owner_id) {
            return Err(ApiError::Forbidden);
        }
        if !actor.has_grant(ResourceKind::Todo) {
            return Err(ApiError::Forbidden);
        }
        policy::screen(EntityKind::Todo, Operation::Update, actor.access_tier(), data)?;

        if let Some(title) = str_field(data, "title") {
            todo.title = title.to_string();
        }
        if let Some(completed) = bool_field(data, "completed") {
            todo.completed = completed;
        }
        apply_nullable(&mut todo.content, data, "content");
        apply_nullable(&mut todo.due_date, data, "dueDate");
        apply_nullable(&mut todo.scope, data, "scope");
        apply_nullable(&mut todo.scope_date, data, "scopeDate");

        todo.updated_at = Utc::now();
        self.store.update(&todo).await?;
        Ok(todo)
    }

    /// Hard delete, by the granted owner or an admin.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> ApiResult<()> {
        actor.authenticated().ok_or(ApiError::Unauthorized)?;
        let todo = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PreconditionFailed("todo"))?;

        let owner_with_grant = actor.owns(todo.owner_id) && actor.has_grant(ResourceKind::Todo);
        if !(owner_with_grant || actor.is_admin()) {
            return Err(ApiError::Forbidden);
        }

        self.store.delete(todo.id).await?;
        info!("Deleted todo {}", todo.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PrivilegeTier;
    use crate::models::AuthenticatedUser;
    use crate::repositories::memory::MemoryTodoStore;
    use serde_json::json;

    fn service() -> (TodoService, MemoryTodoStore) {
        let store = MemoryTodoStore::default();
        (TodoService::new(Arc::new(store.clone())), store)
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().expect("test body must be an object").clone()
    }

    fn granted_owner() -> Actor {
        Actor::User(AuthenticatedUser {
            id: Uuid::new_v4(),
            tier: PrivilegeTier::Normal,
            grants: vec![ResourceKind::Todo, ResourceKind::Article],
        })
    }

    fn ungranted(id: Uuid) -> Actor {
        Actor::User(AuthenticatedUser {
            id,
            tier: PrivilegeTier::Normal,
            grants: vec![ResourceKind::Article],
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
    async fn create_requires_identity_and_grant() {
        let (service, _) = service();
        let payload = body(json!({"title": "water the plants"}));

        let err = service.create(&payload, &Actor::Anonymous).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        let err = service
            .create(&payload, &ungranted(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let owner = granted_owner();
        let todo = service.create(&payload, &owner).await.unwrap();
        assert_eq!(todo.owner_id, owner.id().unwrap());
        assert!(!todo.completed);
    }

    #[tokio::test]
    async fn foreign_fields_are_rejected() {
        let (service, _) = service();
        let err = service
            .create(
                &body(json!({"title": "x", "ownerId": "someone-else"})),
                &granted_owner(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ForbiddenField(f) if f == "ownerId"));
    }

    #[tokio::test]
    async fn update_is_owner_only_even_for_admins() {
        let (service, _) = service();
        let owner = granted_owner();
        let todo = service
            .create(&body(json!({"title": "first"})), &owner)
            .await
            .unwrap();

        let err = service
            .update(todo.id, &body(json!({"title": "hijack"})), &granted_owner())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let err = service
            .update(todo.id, &body(json!({"title": "hijack"})), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let updated = service
            .update(
                todo.id,
                &body(json!({"title": "second", "completed": true})),
                &owner,
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "second");
        assert!(updated.completed);
    }

    #[tokio::test]
    async fn owner_without_grant_is_forbidden() {
        let (service, _) = service();
        let owner = granted_owner();
        let todo = service
            .create(&body(json!({"title": "first"})), &owner)
            .await
            .unwrap();

        // the same identity, but with the TODO grant revoked
        let revoked = ungranted(owner.id().unwrap());
        let err = service
            .update(todo.id, &body(json!({"completed": true})), &revoked)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let err = service.delete(todo.id, &revoked).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[tokio::test]
    async fn explicit_null_clears_optional_fields() {
        let (service, _) = service();
        let owner = granted_owner();
        let todo = service
            .create(
                &body(json!({"title": "x", "content": "notes", "dueDate": "2024-06-01"})),
                &owner,
            )
            .await
            .unwrap();
        assert_eq!(todo.content.as_deref(), Some("notes"));

        let updated = service
            .update(todo.id, &body(json!({"content": null, "dueDate": null})), &owner)
            .await
            .unwrap();
        assert_eq!(updated.content, None);
        assert_eq!(updated.due_date, None);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_owner_and_filterable() {
        let (service, _) = service();
        let alice = granted_owner();
        let bob = granted_owner();

        service.create(&body(json!({"title": "a1"})), &alice).await.unwrap();
        service
            .create(&body(json!({"title": "a2", "completed": true})), &alice)
            .await
            .unwrap();
        service.create(&body(json!({"title": "b1"})), &bob).await.unwrap();

        let all = service.list(&TodoFilter::default(), &alice).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.owner_id == alice.id().unwrap()));

        let done = service
            .list(&TodoFilter { completed: Some(true) }, &alice)
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].title, "a2");
    }

    #[tokio::test]
    async fn delete_is_hard_and_admin_may_remove_any() {
        let (service, store) = service();
        let owner = granted_owner();
        let todo = service
            .create(&body(json!({"title": "x"})), &owner)
            .await
            .unwrap();

        let err = service
            .delete(todo.id, &granted_owner())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        service.delete(todo.id, &admin()).await.unwrap();
        assert!(store.rows.lock().await.is_empty());

        let err = service.delete(todo.id, &owner).await.unwrap_err();
        assert!(matches!(err, ApiError::PreconditionFailed("todo")));
    }

    #[tokio::test]
    async fn read_requires_owner_or_admin() {
        let (service, _) = service();
        let owner = granted_owner();
        let todo = service
            .create(&body(json!({"title": "x"})), &owner)
            .await
            .unwrap();

        assert!(service.read(todo.id, &owner).await.is_ok());
        assert!(service.read(todo.id, &admin()).await.is_ok());

        let err = service.read(todo.id, &granted_owner()).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }
}
