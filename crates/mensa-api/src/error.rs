use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mensa_db::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Wire-level failure taxonomy. Every handler returns this; the
/// `IntoResponse` impl is the single place internal failures get flattened
/// to a generic body so storage details never leak.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    /// Uniform login failure: never distinguishes wrong username from wrong
    /// password.
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Missing bearer token.")]
    Unauthenticated,

    #[error("Invalid or expired token.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many login/registration attempts from this IP, please try again after 15 minutes")]
    RateLimited,

    #[error("Internal server error.")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            error!("internal error: {source:#}");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Default store-to-wire mapping. Handlers that owe the client a
/// domain-specific message (duplicate date, duplicate vote) match on
/// `StoreError` themselves before falling back to this.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ApiError::Conflict("Resource already exists.".into()),
            StoreError::NotFound => ApiError::NotFound("Resource not found.".into()),
            StoreError::RatingOutOfRange => {
                ApiError::InvalidInput("Rating must be an integer between 1 and 5.".into())
            }
            StoreError::LockPoisoned | StoreError::Sqlite(_) => {
                ApiError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

/// Blocking store calls run under `spawn_blocking`; a join failure is an
/// internal error like any other.
pub fn join_err(err: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(anyhow::anyhow!("blocking task failed: {err}"))
}
