use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS meals (
            id          TEXT PRIMARY KEY,
            date        TEXT NOT NULL UNIQUE,
            menu        TEXT NOT NULL,
            image_url   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id          TEXT PRIMARY KEY,
            meal_id     TEXT NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            comment     TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(meal_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_meal
            ON reviews(meal_id);

        CREATE TABLE IF NOT EXISTS menu_requests (
            id              TEXT PRIMARY KEY,
            request_date    TEXT NOT NULL,
            requested_menu  TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
