use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::error::ApiError;
use crate::token;

/// Extract and validate the bearer token on protected routes. A missing or
/// malformed header is 401; a present token that fails signature or expiry
/// checks is 403. Decoded claims land in request extensions for handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    let claims = token::verify(&state.jwt_secret, bearer).map_err(|_| ApiError::Forbidden)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
