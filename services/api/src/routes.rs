//! API routes and handlers

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::actor_context;
use crate::models::{Actor, TodoFilter, UserResponse};
use crate::repositories::UserLookup;
use crate::state::AppState;
use crate::validation::Rule;

/// Response for token issuance
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub login: String,
    pub password: String,
}

/// Request for token refresh
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request for account activation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateAccountRequest {
    pub email: String,
    pub unique_identifier: String,
}

/// Request for password reset
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub unique_identifier: String,
    pub password: String,
}

/// Listing filter accepted by GET /todos
#[derive(Deserialize)]
pub struct TodoListQuery {
    pub completed: Option<bool>,
}

/// Pagination accepted by GET /articles
#[derive(Deserialize)]
pub struct ArticleListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/token/refresh", post(refresh_token))
        .route("/users/activate", post(activate_account))
        .route("/users/reset-password", post(reset_password))
        .route(
            "/users/:key",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/:id",
            get(get_article).patch(update_article).delete(delete_article),
        )
        .layer(middleware::from_fn_with_state(state.clone(), actor_context))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api",
    }))
}

fn body_to_map(value: Value) -> ApiResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::Validation("request body must be a JSON object".into())),
    }
}

/// Check the shape of a mailed activation identifier before parsing it.
fn parse_identifier(raw: &str) -> ApiResult<Uuid> {
    if !Rule::Uuid.check(&Value::String(raw.to_string())) {
        return Err(ApiError::Validation(
            "invalid value for field 'uniqueIdentifier'".into(),
        ));
    }
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::Validation("invalid value for field 'uniqueIdentifier'".into()))
}

/// Validate and parse a numeric query parameter.
fn parse_page_param(raw: Option<&str>, name: &str) -> ApiResult<Option<usize>> {
    match raw {
        None => Ok(None),
        Some(s) => {
            if !Rule::Numeric.check(&Value::String(s.to_string())) {
                return Err(ApiError::Validation(format!(
                    "invalid value for parameter '{name}'"
                )));
            }
            s.trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ApiError::Validation(format!("invalid value for parameter '{name}'")))
        }
    }
}

/// Resolve a path segment into a user lookup key: UUID, email, or username.
fn parse_user_key(segment: &str) -> UserLookup {
    if let Ok(id) = Uuid::parse_str(segment) {
        UserLookup::ById(id)
    } else if segment.contains('@') {
        UserLookup::ByEmail(segment.to_string())
    } else {
        UserLookup::ByUsername(segment.to_string())
    }
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let body = body_to_map(body)?;
    let user = state.users.create(&body, &actor).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Login with username or email, returning a token pair
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for {}", payload.login);

    if !state.rate_limiter.is_allowed(&payload.login).await {
        return Err(ApiError::Forbidden);
    }

    let user = state
        .users
        .authenticate(&payload.login, &payload.password)
        .await?;
    state.rate_limiter.record_success(&payload.login).await;

    Ok(Json(issue_tokens(&state, user.id)?))
}

/// Exchange a refresh token for a fresh pair
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized)?;

    if claims.token_type != crate::jwt::TokenType::Refresh {
        return Err(ApiError::Unauthorized);
    }

    // The account must still be live and activated.
    let user = state.users.require_active(claims.sub).await?;

    Ok(Json(issue_tokens(&state, user.id)?))
}

fn issue_tokens(state: &AppState, user_id: Uuid) -> ApiResult<TokenResponse> {
    let access_token = state
        .jwt_service
        .generate_access_token(user_id)
        .map_err(ApiError::Unexpected)?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user_id)
        .map_err(ApiError::Unexpected)?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    })
}

/// Activate an account with the mailed identifier
pub async fn activate_account(
    State(state): State<AppState>,
    Json(payload): Json<ActivateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let identifier = parse_identifier(&payload.unique_identifier)?;
    let user = state
        .users
        .activate_account(&payload.email, identifier)
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Reset a password with the mailed identifier
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let identifier = parse_identifier(&payload.unique_identifier)?;
    state
        .users
        .reset_password(&payload.email, identifier, &payload.password)
        .await?;
    Ok(Json(json!({"message": "Password updated"})))
}

/// Fetch a user by id, email, or username
pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let projection = state.users.read(&parse_user_key(&key), &actor).await?;
    Ok(Json(projection))
}

/// Update an account (owner or admin)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let id = Uuid::parse_str(&key).map_err(|_| ApiError::PreconditionFailed("user"))?;
    let body = body_to_map(body)?;
    let user = state.users.update(id, &body, &actor).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Deactivate an account (owner or admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = Uuid::parse_str(&key).map_err(|_| ApiError::PreconditionFailed("user"))?;
    state.users.delete(id, &actor).await?;
    Ok(Json(json!({"message": "Account deactivated"})))
}

/// Create a todo
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let body = body_to_map(body)?;
    let todo = state.todos.create(&body, &actor).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// List the caller's todos
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<TodoListQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = TodoFilter {
        completed: query.completed,
    };
    let todos = state.todos.list(&filter, &actor).await?;
    Ok(Json(todos))
}

/// Fetch one todo
pub async fn get_todo(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let todo = state.todos.read(id, &actor).await?;
    Ok(Json(todo))
}

/// Update a todo
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let body = body_to_map(body)?;
    let todo = state.todos.update(id, &body, &actor).await?;
    Ok(Json(todo))
}

/// Delete a todo
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.todos.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create an article
pub async fn create_article(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let body = body_to_map(body)?;
    let article = state.articles.create(&body, &actor).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// List articles visible to the caller
pub async fn list_articles(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ArticleListQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = parse_page_param(query.limit.as_deref(), "limit")?;
    let offset = parse_page_param(query.offset.as_deref(), "offset")?;

    let articles: Vec<_> = state
        .articles
        .list(&actor)
        .await?
        .into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    Ok(Json(articles))
}

/// Fetch one article
pub async fn get_article(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let article = state.articles.read(id, &actor).await?;
    Ok(Json(article))
}

/// Update an article
pub async fn update_article(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let body = body_to_map(body)?;
    let article = state.articles.update(id, &body, &actor).await?;
    Ok(Json(article))
}

/// Soft-delete an article
pub async fn delete_article(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.articles.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
