use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};

use crate::error::ApiError;

/// JSON body extractor that folds every rejection (missing body, bad
/// content type, missing or mistyped fields) into the 400 `InvalidInput`
/// wire error. Handlers receive an already-validated, typed request object
/// and never re-check field presence.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))?;
        Ok(Self(value))
    }
}
