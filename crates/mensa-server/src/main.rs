use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use mensa_api::rate_limit::RateLimiter;
use mensa_api::{AppState, AppStateInner, routes};

/// Shared window for register+login throttling.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mensa=debug,mensa_api=debug,mensa_db=debug,tower_http=debug".into()),
        )
        .init();

    // Config. The signing secret has no default: starting without one would
    // mean issuing forgeable sessions.
    let jwt_secret = std::env::var("MENSA_JWT_SECRET")
        .context("MENSA_JWT_SECRET must be set; refusing to start without a signing secret")?;
    let db_path = std::env::var("MENSA_DB_PATH").unwrap_or_else(|_| "mensa.db".into());
    let host = std::env::var("MENSA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MENSA_PORT")
        .unwrap_or_else(|_| "3001".into())
        .parse()?;
    let rate_limit_max: u32 = std::env::var("MENSA_RATE_LIMIT_MAX")
        .unwrap_or_else(|_| "100".into())
        .parse()?;

    // Init database
    let db = mensa_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state; the limiter lives here so it is constructed once per
    // process, matching its single-instance semantics.
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        limiter: RateLimiter::new(rate_limit_max, RATE_LIMIT_WINDOW),
    });

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Mensa server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
