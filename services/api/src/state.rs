//! Application state shared across handlers

use std::sync::Arc;

use crate::jwt::JwtService;
use crate::middleware::Authenticator;
use crate::rate_limiter::RateLimiter;
use crate::services::{ArticleService, TodoService, UserService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub todos: TodoService,
    pub articles: ArticleService,
    pub authenticator: Arc<dyn Authenticator>,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
}
