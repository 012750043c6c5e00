use anyhow::anyhow;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use mensa_db::StoreError;
use mensa_types::api::{LoginRequest, LoginResponse, RegisterRequest, StatusMessage};

use crate::AppState;
use crate::error::{ApiError, join_err};
use crate::extract::ValidJson;
use crate::token;

const USERNAME_RULE: &str = "Username must be 3-20 alphanumeric characters.";
const PASSWORD_RULE: &str = "Password must be at least 8 characters long, contain at least one uppercase letter, one lowercase letter, one number, and one special character.";

/// Punctuation accepted as the required "special character".
const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

fn valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (3..=20).contains(&len) && username.chars().all(|c| c.is_ascii_alphanumeric())
}

fn valid_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// POST /register. Validation failures name the broken rule per field;
/// everything past validation is flattened to one generic success so the
/// response never reveals whether a username already exists.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !valid_username(&req.username) {
        return Err(ApiError::InvalidInput(USERNAME_RULE.into()));
    }
    if !valid_password(&req.password) {
        return Err(ApiError::InvalidInput(PASSWORD_RULE.into()));
    }

    // Salted, slow hash; the work factor is the library default, fixed at
    // construction of the hasher.
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow!("password hashing failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();
    let db = state.clone();
    let username = req.username.clone();

    let result = tokio::task::spawn_blocking(move || {
        db.db
            .create_user(&user_id.to_string(), &username, &password_hash)
    })
    .await
    .map_err(join_err)?;

    match result {
        Ok(()) => {}
        Err(StoreError::Duplicate) => {
            // Deliberate policy: report success for an existing username so
            // registration responses cannot be used to enumerate accounts.
            warn!("registration attempt for existing username {:?} suppressed", req.username);
        }
        Err(e) => return Err(e.into()),
    }

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage {
            message: "User registered successfully".into(),
        }),
    ))
}

/// POST /login. Every failure mode (bad shape, unknown user, wrong
/// password) collapses into the same generic message.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !valid_username(&req.username) || !valid_password(&req.password) {
        return Err(ApiError::InvalidCredentials);
    }

    let db = state.clone();
    let username = req.username.clone();
    let user = tokio::task::spawn_blocking(move || db.db.user_by_username(&username))
        .await
        .map_err(join_err)??
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow!("stored hash unparseable: {e}")))?;

    // Library-provided verify: constant-time comparison of the derived key.
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt user id {:?}: {e}", user.id)))?;

    let token = token::issue(&state.jwt_secret, user_id, &user.username, Utc::now())
        .map_err(|e| ApiError::Internal(anyhow!("token signing failed: {e}")))?;

    Ok(Json(LoginResponse {
        message: "Logged in successfully".into(),
        token,
        user_id,
    }))
}
