//! Request authentication: bearer credential to actor context
//!
//! The middleware resolves every request to an [`Actor`] before handlers
//! run. A missing header means an anonymous actor; a present header must
//! verify, and must belong to an active, activated account.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::error::{ApiError, ApiResult};
use crate::jwt::{JwtService, TokenType};
use crate::models::{Actor, AuthenticatedUser};
use crate::repositories::{UserLookup, UserStore};
use crate::state::AppState;

/// Stateless authentication collaborator consumed by the middleware.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve a bearer credential into an actor.
    async fn verify_token(&self, token: &str) -> ApiResult<Actor>;
}

/// Authenticator backed by RS256 tokens and the user store.
pub struct JwtAuthenticator {
    jwt_service: JwtService,
    users: Arc<dyn UserStore>,
}

impl JwtAuthenticator {
    pub fn new(jwt_service: JwtService, users: Arc<dyn UserStore>) -> Self {
        Self { jwt_service, users }
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn verify_token(&self, token: &str) -> ApiResult<Actor> {
        let claims = self
            .jwt_service
            .validate_token(token)
            .map_err(|_| ApiError::Unauthorized)?;

        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized);
        }

        // Re-check the account on every request: a deactivated or deleted
        // user keeps a syntactically valid token but no access.
        let user = self
            .users
            .find(&UserLookup::ById(claims.sub))
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if !user.activated {
            return Err(ApiError::Unauthorized);
        }

        Ok(Actor::User(AuthenticatedUser {
            id: user.id,
            tier: user.privilege_tier,
            grants: user.granted_resources,
        }))
    }
}

/// Attach the actor context to the request.
pub async fn actor_context(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = match bearer {
        None => Actor::Anonymous,
        Some(TypedHeader(auth)) => state.authenticator.verify_token(auth.token()).await?,
    };

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
