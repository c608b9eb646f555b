//! API error taxonomy and HTTP mapping
//!
//! Lifecycle services return these as typed results; this is the only place
//! where an error kind becomes a status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repositories::StoreError;

/// Failure modes surfaced by the lifecycle services.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A permitted field carried a malformed or disallowed value
    #[error("validation failed: {0}")]
    Validation(String),

    /// A request field outside the actor's permitted set
    #[error("field '{0}' is not permitted")]
    ForbiddenField(String),

    /// The actor lacks rights over an otherwise valid operation
    #[error("forbidden")]
    Forbidden,

    /// Missing/invalid credential or inactive account
    #[error("unauthorized")]
    Unauthorized,

    /// The referenced entity does not exist
    #[error("{0} does not exist")]
    PreconditionFailed(&'static str),

    /// Uniqueness violation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage or infrastructure failure; detail is logged, never exposed
    #[error("internal server error")]
    Unexpected(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => ApiError::Conflict(what),
            StoreError::Unexpected(e) => ApiError::Unexpected(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ForbiddenField(_) | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unexpected(e) => {
                error!("unexpected failure: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_documented_status_codes() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::ForbiddenField("x".into()), StatusCode::FORBIDDEN),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::PreconditionFailed("user"), StatusCode::PRECONDITION_FAILED),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ApiError::Unexpected(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::Unexpected(anyhow::anyhow!("connection refused at 10.0.0.1"));
        assert_eq!(err.to_string(), "internal server error");
    }
}
