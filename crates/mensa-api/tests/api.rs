/// Integration tests: drive the full router (routing, throttle and auth
/// middleware, handlers, SQLite store) through tower's `oneshot`, one
/// in-memory database per test.
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use mensa_api::rate_limit::RateLimiter;
use mensa_api::{AppState, AppStateInner, routes, token};

const PASSWORD: &str = "Sup3r-secret";

fn state_with_cap(cap: u32) -> AppState {
    Arc::new(AppStateInner {
        db: mensa_db::Database::open_in_memory().expect("in-memory db"),
        jwt_secret: "integration-test-secret".into(),
        limiter: RateLimiter::new(cap, Duration::from_secs(900)),
    })
}

fn state() -> AppState {
    state_with_cap(100)
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = routes::router(state.clone())
        .oneshot(request)
        .await
        .expect("router is infallible");

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_with_token(uri: &str, bearer: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn register_and_login(state: &AppState, username: &str) -> (Uuid, String) {
    let (status, _) = send(
        state,
        post("/register", json!({"username": username, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        state,
        post("/login", json!({"username": username, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let user_id: Uuid = body["userId"].as_str().unwrap().parse().unwrap();
    (user_id, body["token"].as_str().unwrap().to_string())
}

async fn create_meal(state: &AppState, date: &str, menu: &str) -> Uuid {
    let (status, body) = send(state, post("/meals", json!({"date": date, "menu": menu}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
}

// -- Auth --

#[tokio::test]
async fn register_then_login_yields_decodable_token() {
    let state = state();
    let (user_id, bearer) = register_and_login(&state, "alice").await;

    let claims = token::verify(&state.jwt_secret, &bearer).expect("token decodes");
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.username, "alice");
}

#[tokio::test]
async fn duplicate_registration_is_masked_but_not_stored() {
    let state = state();
    let body = json!({"username": "alice", "password": PASSWORD});

    let (first_status, first_body) = send(&state, post("/register", body.clone())).await;
    let (second_status, second_body) = send(&state, post("/register", body)).await;

    // Same generic success either way, so responses cannot enumerate users.
    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::CREATED);
    assert_eq!(first_body, second_body);
    assert_eq!(first_body["message"], "User registered successfully");

    // The wire lies by design; storage must not.
    assert_eq!(state.db.user_count().unwrap(), 1);
}

#[tokio::test]
async fn registration_validation_names_the_broken_rule() {
    let state = state();

    let (status, body) = send(
        &state,
        post("/register", json!({"username": "a!", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username must be 3-20 alphanumeric characters.");

    let (status, body) = send(
        &state,
        post("/register", json!({"username": "alice", "password": "weak"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Password must be at least 8 characters")
    );
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let state = state();
    register_and_login(&state, "alice").await;

    let attempts = [
        json!({"username": "nobody", "password": PASSWORD}),
        json!({"username": "alice", "password": "Wrong-pass1"}),
        json!({"username": "not a name!", "password": PASSWORD}),
    ];

    for attempt in attempts {
        let (status, body) = send(&state, post("/login", attempt)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid username or password.");
    }
}

#[tokio::test]
async fn throttled_login_never_reaches_credential_check() {
    // Cap of 3 attempts shared by register+login. The register call is
    // attempt 1, the two logins are 2 and 3; the 4th attempt must be
    // refused even though the credentials are valid, proving the limiter
    // fires before any lookup or hash comparison.
    let state = state_with_cap(3);
    let body = json!({"username": "alice", "password": PASSWORD});

    let (status, _) = send(&state, post("/register", body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    for _ in 0..2 {
        let (status, _) = send(&state, post("/login", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, out) = send(&state, post("/login", body)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        out["error"],
        "Too many login/registration attempts from this IP, please try again after 15 minutes"
    );
}

// -- Meals --

#[tokio::test]
async fn one_meal_per_date_and_date_frees_after_delete() {
    let state = state();
    let meal_id = create_meal(&state, "2025-06-02", "Fried rice").await;

    let (status, body) = send(
        &state,
        post("/meals", json!({"date": "2025-06-02", "menu": "Noodles"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A meal for this date already exists.");

    let (status, _) = send(&state, delete(&format!("/meals/{meal_id}"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &state,
        post("/meals", json!({"date": "2025-06-02", "menu": "Noodles"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn meal_input_shape_is_rejected_up_front() {
    let state = state();

    // Missing date: caught by the typed extractor, no store call involved.
    let (status, _) = send(&state, post("/meals", json!({"menu": "Noodles"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Empty menu text.
    let (status, body) = send(
        &state,
        post("/meals", json!({"date": "2025-06-02", "menu": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Date and menu are required.");

    // Not a calendar date.
    let (status, _) = send(
        &state,
        post("/meals", json!({"date": "not-a-date", "menu": "Noodles"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn meals_list_and_date_lookup() {
    let state = state();
    create_meal(&state, "2025-06-02", "Fried rice").await;
    create_meal(&state, "2025-06-04", "Green curry").await;
    create_meal(&state, "2025-06-03", "Noodles").await;

    let (status, body) = send(&state, get("/meals")).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|meal| meal["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2025-06-04", "2025-06-03", "2025-06-02"]);

    let (status, body) = send(&state, get("/meals/2025-06-03")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["menu"], "Noodles");

    let (status, body) = send(&state, get("/meals/2025-06-05")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Meal not found for this date.");
}

// -- Reviews --

#[tokio::test]
async fn second_vote_is_rejected_and_first_stands() {
    let state = state();
    let (_, bearer) = register_and_login(&state, "alice").await;
    let meal_id = create_meal(&state, "2025-06-02", "Fried rice").await;

    let (status, _) = send(
        &state,
        post_with_token("/reviews", &bearer, json!({"meal_id": meal_id, "rating": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &state,
        post_with_token("/reviews", &bearer, json!({"meal_id": meal_id, "rating": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You have already reviewed this meal.");

    // Exactly one stored vote, and it is the first one.
    let rows = state.db.reviews_by_meal(&meal_id.to_string()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].rating, 5);
}

#[tokio::test]
async fn deleting_a_meal_removes_its_reviews() {
    let state = state();
    let meal_id = create_meal(&state, "2025-06-02", "Fried rice").await;

    for name in ["alice", "bob", "carol"] {
        let (_, bearer) = register_and_login(&state, name).await;
        let (status, _) = send(
            &state,
            post_with_token("/reviews", &bearer, json!({"meal_id": meal_id, "rating": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(&state, delete(&format!("/meals/{meal_id}"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&state, get(&format!("/reviews/{meal_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert!(state.db.reviews_by_meal(&meal_id.to_string()).unwrap().is_empty());
}

#[tokio::test]
async fn review_auth_failures() {
    let state = state();
    let meal_id = create_meal(&state, "2025-06-02", "Fried rice").await;
    let body = json!({"meal_id": meal_id, "rating": 5});

    // No token at all.
    let (status, _) = send(&state, post("/reviews", body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Token signed with the right secret but already expired.
    let stale = token::issue(
        &state.jwt_secret,
        Uuid::new_v4(),
        "ghost",
        Utc::now() - chrono::Duration::hours(2),
    )
    .unwrap();
    let (status, _) = send(&state, post_with_token("/reviews", &stale, body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Garbage token.
    let (status, _) = send(&state, post_with_token("/reviews", "not-a-jwt", body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let state = state();
    let (_, bearer) = register_and_login(&state, "alice").await;
    let meal_id = create_meal(&state, "2025-06-02", "Fried rice").await;

    for rating in [0, 6] {
        let (status, body) = send(
            &state,
            post_with_token("/reviews", &bearer, json!({"meal_id": meal_id, "rating": rating})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Rating must be an integer between 1 and 5.");
    }
    assert!(state.db.reviews_by_meal(&meal_id.to_string()).unwrap().is_empty());
}

#[tokio::test]
async fn tally_counts_votes_per_bucket() {
    let state = state();
    let meal_id = create_meal(&state, "2025-06-02", "Fried rice").await;

    for (name, rating) in [("alice", 5), ("bob", 5), ("carol", 4), ("dave", 1)] {
        let (_, bearer) = register_and_login(&state, name).await;
        let (status, _) = send(
            &state,
            post_with_token("/reviews", &bearer, json!({"meal_id": meal_id, "rating": rating})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&state, get(&format!("/reviews/{meal_id}/tally"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"1": 1, "2": 0, "3": 0, "4": 1, "5": 2}));

    // A meal nobody has voted on tallies to all-zero buckets.
    let quiet_meal = create_meal(&state, "2025-06-03", "Noodles").await;
    let (status, body) = send(&state, get(&format!("/reviews/{quiet_meal}/tally"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"1": 0, "2": 0, "3": 0, "4": 0, "5": 0}));
}

// -- Menu requests --

#[tokio::test]
async fn menu_request_round_trip() {
    let state = state();

    let (status, _) = send(
        &state,
        post(
            "/menu-requests",
            json!({"request_date": "2025-06-07", "requested_menu": "Green curry"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &state,
        post(
            "/menu-requests",
            json!({"request_date": "2025-06-14", "requested_menu": "Pad thai"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&state, get("/menu-requests")).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|request| request["request_date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2025-06-14", "2025-06-07"]);

    // Missing menu text.
    let (status, _) = send(
        &state,
        post("/menu-requests", json!({"request_date": "2025-06-07"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
