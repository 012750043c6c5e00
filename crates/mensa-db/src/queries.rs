use rusqlite::{Connection, OptionalExtension};

use crate::models::{MealRow, MenuRequestRow, ReviewRow, UserRow};
use crate::{Database, StoreError};

impl Database {
    // -- Users --

    /// Insert a new credential row. `StoreError::Duplicate` when the
    /// username is already taken (case-sensitive exact match).
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn user_count(&self) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(n)
        })
    }

    // -- Meals --

    /// One meal per calendar date; a second insert for the same date is a
    /// `StoreError::Duplicate`.
    pub fn insert_meal(
        &self,
        id: &str,
        date: &str,
        menu: &str,
        image_url: Option<&str>,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO meals (id, date, menu, image_url) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, date, menu, image_url],
            )?;
            Ok(())
        })
    }

    /// Delete a meal and, via the FK cascade, every review that references
    /// it. One statement, so the cascade is atomic with the delete.
    pub fn delete_meal(&self, id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM meals WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    /// All meals, newest date first. Dates are stored as ISO `YYYY-MM-DD`
    /// text, so lexicographic ordering is chronological.
    pub fn list_meals(&self) -> Result<Vec<MealRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, date, menu, image_url, created_at FROM meals ORDER BY date DESC",
            )?;
            let rows = stmt
                .query_map([], map_meal_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn meal_by_date(&self, date: &str) -> Result<Option<MealRow>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .prepare("SELECT id, date, menu, image_url, created_at FROM meals WHERE date = ?1")?
                .query_row([date], map_meal_row)
                .optional()?;
            Ok(row)
        })
    }

    // -- Reviews --

    /// First-write-wins vote: the (meal, user) uniqueness constraint makes a
    /// second insert a `StoreError::Duplicate`, never an overwrite. Rating
    /// is range-checked here rather than trusting the caller.
    pub fn insert_review(
        &self,
        id: &str,
        meal_id: &str,
        user_id: &str,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<(), StoreError> {
        if !(1..=5).contains(&rating) {
            return Err(StoreError::RatingOutOfRange);
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reviews (id, meal_id, user_id, rating, comment) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, meal_id, user_id, rating, comment],
            )?;
            Ok(())
        })
    }

    /// Reviews for one meal; order unspecified, the tally does not care.
    pub fn reviews_by_meal(&self, meal_id: &str) -> Result<Vec<ReviewRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, meal_id, user_id, rating, comment, created_at FROM reviews WHERE meal_id = ?1",
            )?;
            let rows = stmt
                .query_map([meal_id], |row| {
                    Ok(ReviewRow {
                        id: row.get(0)?,
                        meal_id: row.get(1)?,
                        user_id: row.get(2)?,
                        rating: row.get(3)?,
                        comment: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Menu requests --

    /// Append-only suggestion box: no uniqueness, no ownership link.
    pub fn insert_menu_request(
        &self,
        id: &str,
        request_date: &str,
        requested_menu: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO menu_requests (id, request_date, requested_menu) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, request_date, requested_menu],
            )?;
            Ok(())
        })
    }

    pub fn list_menu_requests(&self) -> Result<Vec<MenuRequestRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, request_date, requested_menu, created_at FROM menu_requests ORDER BY request_date DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(MenuRequestRow {
                        id: row.get(0)?,
                        request_date: row.get(1)?,
                        requested_menu: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn map_meal_row(row: &rusqlite::Row<'_>) -> Result<MealRow, rusqlite::Error> {
    Ok(MealRow {
        id: row.get(0)?,
        date: row.get(1)?,
        menu: row.get(2)?,
        image_url: row.get(3)?,
        created_at: row.get(4)?,
    })
}
