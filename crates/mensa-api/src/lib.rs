pub mod auth;
pub mod error;
pub mod extract;
pub mod meals;
pub mod menu_requests;
pub mod middleware;
pub mod rate_limit;
pub mod reviews;
pub mod routes;
pub mod tally;
pub mod token;

use std::sync::Arc;

use mensa_db::Database;
use rate_limit::RateLimiter;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Token-signing secret: immutable after construction, never a mutable
    /// global.
    pub jwt_secret: String,
    pub limiter: RateLimiter,
}
