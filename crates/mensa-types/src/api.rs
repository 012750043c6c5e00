use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// Signed session token claims. Canonical definition lives here in
/// mensa-types so the issuing handler and the verifying middleware share
/// one type. Stateless: there is no server-side revocation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

// -- Meals --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMealRequest {
    pub date: NaiveDate,
    pub menu: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

// -- Reviews --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReviewRequest {
    pub meal_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
}

// -- Menu requests --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestMenuRequest {
    pub request_date: NaiveDate,
    pub requested_menu: String,
}

// -- Generic response envelopes --

/// Plain confirmation body, e.g. register (always generic) and delete.
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

/// Confirmation body for creates that hand back the new row id.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: Uuid,
}
