use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use mensa_types::api::Claims;

/// Absolute session lifetime. There is no refresh and no server-side
/// revocation; expiry is the only thing that ends a session.
pub fn token_ttl() -> Duration {
    Duration::hours(1)
}

/// Sign a session token. `now` is passed in rather than read from the
/// system clock so expiry behavior is testable.
pub fn issue(
    secret: &str,
    user_id: Uuid,
    username: &str,
    now: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + token_ttl()).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a bearer token (signature + expiry).
pub fn verify(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn issued_token_round_trips() {
        let user_id = Uuid::new_v4();
        let token = issue(SECRET, user_id, "alice", Utc::now()).unwrap();

        let claims = verify(SECRET, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, token_ttl().num_seconds() as usize);
    }

    #[test]
    fn expired_token_is_rejected() {
        // Issued two hours ago, so it expired an hour ago: well past any
        // validation leeway.
        let issued_at = Utc::now() - Duration::hours(2);
        let token = issue(SECRET, Uuid::new_v4(), "alice", issued_at).unwrap();

        let err = verify(SECRET, &token).unwrap_err();
        assert_eq!(
            *err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(SECRET, Uuid::new_v4(), "alice", Utc::now()).unwrap();
        assert!(verify("some-other-secret", &token).is_err());
    }
}
