/// Database row types — these map directly to SQLite rows.
/// Distinct from the mensa-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct MealRow {
    pub id: String,
    pub date: String,
    pub menu: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

pub struct ReviewRow {
    pub id: String,
    pub meal_id: String,
    pub user_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

pub struct MenuRequestRow {
    pub id: String,
    pub request_date: String,
    pub requested_menu: String,
    pub created_at: String,
}
