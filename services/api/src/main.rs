use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod constants;
mod error;
mod jwt;
mod middleware;
mod models;
mod notifier;
mod policy;
mod rate_limiter;
mod repositories;
mod routes;
mod services;
mod state;
mod validation;

use std::sync::Arc;

use common::database::{DatabaseConfig, health_check, init_pool};

use crate::middleware::JwtAuthenticator;
use crate::notifier::{NotifierConfig, WebhookNotifier};
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
use crate::repositories::{ArticleRepository, TodoRepository, UserRepository, UserStore};
use crate::services::{ArticleService, TodoService, UserService};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting jotter API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    // Initialize JWT service
    let jwt_config = jwt::JwtConfig::from_env()?;
    let jwt_service = jwt::JwtService::new(jwt_config)?;

    // Collaborators
    let notifier = Arc::new(WebhookNotifier::new(NotifierConfig::from_env()));
    let user_store: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
    let todo_store = Arc::new(TodoRepository::new(pool.clone()));
    let article_store = Arc::new(ArticleRepository::new(pool.clone()));

    let app_state = AppState {
        users: UserService::new(user_store.clone(), notifier),
        todos: TodoService::new(todo_store),
        articles: ArticleService::new(article_store),
        authenticator: Arc::new(JwtAuthenticator::new(jwt_service.clone(), user_store)),
        jwt_service,
        rate_limiter: RateLimiter::new(RateLimiterConfig::from_env()),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("API service listening on 0.0.0.0:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
