use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One calendar day's published menu entry. The image reference is an opaque
/// string produced by the upload collaborator; this service only stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: Uuid,
    pub date: NaiveDate,
    pub menu: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// A single user's 1-5 rating for one meal; functions as a poll vote.
/// At most one exists per (meal, user) pair and it is immutable once cast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
}

/// An unauthenticated free-text suggestion for a future menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuRequest {
    pub id: Uuid,
    pub request_date: NaiveDate,
    pub requested_menu: String,
}
