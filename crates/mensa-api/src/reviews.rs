use axum::{Extension, Json};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;
use uuid::Uuid;

use mensa_db::StoreError;
use mensa_db::models::ReviewRow;
use mensa_types::api::{Claims, CreateReviewRequest, CreatedResponse};
use mensa_types::models::Review;

use crate::AppState;
use crate::error::{ApiError, join_err};
use crate::extract::ValidJson;
use crate::tally;

/// POST /reviews (protected). The reviewer comes from the verified token,
/// never from the body. A second vote for the same meal is a 409; the
/// first rating stands.
pub async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(req): ValidJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::new_v4();
    let db = state.clone();
    let user_id = claims.sub;

    let result = tokio::task::spawn_blocking(move || {
        db.db.insert_review(
            &id.to_string(),
            &req.meal_id.to_string(),
            &user_id.to_string(),
            i64::from(req.rating),
            req.comment.as_deref(),
        )
    })
    .await
    .map_err(join_err)?;

    match result {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(CreatedResponse {
                message: "Review added successfully".into(),
                id,
            }),
        )),
        Err(StoreError::Duplicate) => Err(ApiError::Conflict(
            "You have already reviewed this meal.".into(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// GET /reviews/{meal_id}. Order unspecified; callers aggregate.
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(meal_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = reviews_for_meal(&state, meal_id).await?;
    Ok(Json(reviews))
}

/// GET /reviews/{meal_id}/tally — the poll result, recomputed from the
/// review list on every read.
pub async fn tally_for_meal(
    State(state): State<AppState>,
    Path(meal_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = reviews_for_meal(&state, meal_id).await?;
    Ok(Json(tally::tally(&reviews)))
}

async fn reviews_for_meal(state: &AppState, meal_id: Uuid) -> Result<Vec<Review>, ApiError> {
    let db = state.clone();

    let rows = tokio::task::spawn_blocking(move || db.db.reviews_by_meal(&meal_id.to_string()))
        .await
        .map_err(join_err)??;

    Ok(rows.into_iter().map(review_from_row).collect())
}

fn review_from_row(row: ReviewRow) -> Review {
    Review {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt review id '{}': {}", row.id, e);
            Uuid::default()
        }),
        meal_id: row.meal_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt meal_id '{}' on review '{}': {}", row.meal_id, row.id, e);
            Uuid::default()
        }),
        user_id: row.user_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user_id '{}' on review '{}': {}", row.user_id, row.id, e);
            Uuid::default()
        }),
        rating: u8::try_from(row.rating).unwrap_or_else(|_| {
            warn!("Corrupt rating {} on review '{}'", row.rating, row.id);
            0
        }),
        comment: row.comment,
    }
}
