use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use mensa_db::StoreError;
use mensa_db::models::MealRow;
use mensa_types::api::{CreateMealRequest, CreatedResponse, StatusMessage};
use mensa_types::models::Meal;

use crate::AppState;
use crate::error::{ApiError, join_err};
use crate::extract::ValidJson;

/// POST /meals. One meal per calendar date; a duplicate date is a 409.
pub async fn create_meal(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateMealRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.menu.trim().is_empty() {
        return Err(ApiError::InvalidInput("Date and menu are required.".into()));
    }

    let id = Uuid::new_v4();
    let db = state.clone();

    let result = tokio::task::spawn_blocking(move || {
        db.db.insert_meal(
            &id.to_string(),
            &req.date.to_string(),
            &req.menu,
            req.image_url.as_deref(),
        )
    })
    .await
    .map_err(join_err)?;

    match result {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(CreatedResponse {
                message: "Meal added successfully".into(),
                id,
            }),
        )),
        Err(StoreError::Duplicate) => Err(ApiError::Conflict(
            "A meal for this date already exists.".into(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// DELETE /meals/{id}. The store cascades review deletion atomically with
/// the meal row.
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();

    tokio::task::spawn_blocking(move || db.db.delete_meal(&id.to_string()))
        .await
        .map_err(join_err)?
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("Meal not found.".into()),
            e => e.into(),
        })?;

    Ok(Json(StatusMessage {
        message: "Meal deleted successfully".into(),
    }))
}

/// GET /meals — every published meal, newest date first.
pub async fn list_meals(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();

    let rows = tokio::task::spawn_blocking(move || db.db.list_meals())
        .await
        .map_err(join_err)??;

    let meals: Vec<Meal> = rows.into_iter().map(meal_from_row).collect();
    Ok(Json(meals))
}

/// GET /meals/{date}.
pub async fn meal_by_date(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();

    let row = tokio::task::spawn_blocking(move || db.db.meal_by_date(&date.to_string()))
        .await
        .map_err(join_err)??
        .ok_or_else(|| ApiError::NotFound("Meal not found for this date.".into()))?;

    Ok(Json(meal_from_row(row)))
}

pub(crate) fn meal_from_row(row: MealRow) -> Meal {
    Meal {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt meal id '{}': {}", row.id, e);
            Uuid::default()
        }),
        date: row.date.parse().unwrap_or_else(|e| {
            warn!("Corrupt date '{}' on meal '{}': {}", row.date, row.id, e);
            NaiveDate::default()
        }),
        menu: row.menu,
        image_url: row.image_url,
    }
}
