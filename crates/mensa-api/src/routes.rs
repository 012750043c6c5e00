use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use crate::{AppState, auth, meals, menu_requests, middleware, rate_limit, reviews};

/// The full route table. Auth endpoints sit behind the per-IP throttle;
/// review submission sits behind token verification; everything else is
/// open.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(from_fn_with_state(state.clone(), rate_limit::throttle));

    let protected_routes = Router::new()
        .route("/reviews", post(reviews::create_review))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let open_routes = Router::new()
        .route("/meals", post(meals::create_meal).get(meals::list_meals))
        .route(
            "/meals/{selector}",
            get(meals::meal_by_date).delete(meals::delete_meal),
        )
        .route("/reviews/{meal_id}", get(reviews::list_reviews))
        .route("/reviews/{meal_id}/tally", get(reviews::tally_for_meal))
        .route(
            "/menu-requests",
            post(menu_requests::create_request).get(menu_requests::list_requests),
        );

    Router::new()
        .merge(auth_routes)
        .merge(protected_routes)
        .merge(open_routes)
        .with_state(state)
}
