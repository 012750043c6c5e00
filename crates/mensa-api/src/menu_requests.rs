use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use mensa_db::models::MenuRequestRow;
use mensa_types::api::{CreatedResponse, SuggestMenuRequest};
use mensa_types::models::MenuRequest;

use crate::AppState;
use crate::error::{ApiError, join_err};
use crate::extract::ValidJson;

/// POST /menu-requests. Open suggestion box: no auth, no uniqueness,
/// append-only. Submission-day policy (e.g. Saturdays only) is the UI's
/// concern.
pub async fn create_request(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<SuggestMenuRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.requested_menu.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Request date and requested menu are required.".into(),
        ));
    }

    let id = Uuid::new_v4();
    let db = state.clone();

    tokio::task::spawn_blocking(move || {
        db.db
            .insert_menu_request(&id.to_string(), &req.request_date.to_string(), &req.requested_menu)
    })
    .await
    .map_err(join_err)??;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Menu request added successfully".into(),
            id,
        }),
    ))
}

/// GET /menu-requests — all suggestions, newest request date first.
pub async fn list_requests(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();

    let rows = tokio::task::spawn_blocking(move || db.db.list_menu_requests())
        .await
        .map_err(join_err)??;

    let requests: Vec<MenuRequest> = rows.into_iter().map(request_from_row).collect();
    Ok(Json(requests))
}

fn request_from_row(row: MenuRequestRow) -> MenuRequest {
    MenuRequest {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt menu request id '{}': {}", row.id, e);
            Uuid::default()
        }),
        request_date: row.request_date.parse().unwrap_or_else(|e| {
            warn!(
                "Corrupt request_date '{}' on menu request '{}': {}",
                row.request_date, row.id, e
            );
            NaiveDate::default()
        }),
        requested_menu: row.requested_menu,
    }
}
