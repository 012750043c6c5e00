use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;

/// Per-source-IP attempt counter for the auth endpoints. Fixed window:
/// the first attempt opens a window, every attempt inside it counts
/// (successful or not), and the window resets once it has fully elapsed.
///
/// In-memory and process-local, which is only correct for a single running
/// instance; a multi-instance deployment would move this to a shared
/// counter store.
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Window>>,
}

struct Window {
    started: Instant,
    attempts: u32,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Record one attempt for `key` and report whether it is within the cap.
    /// `now` is injected so window expiry is testable.
    pub fn allow(&self, key: &str, now: Instant) -> bool {
        // A poisoned lock only means another thread panicked mid-update;
        // the counter map itself is still usable.
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let window = buckets.entry(key.to_string()).or_insert(Window {
            started: now,
            attempts: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.attempts = 0;
        }

        window.attempts += 1;
        window.attempts <= self.max_attempts
    }
}

/// Middleware for the register/login routes. Runs before any hashing or
/// credential lookup, so a throttled caller costs no CPU and observes no
/// timing difference between existing and unknown accounts.
pub async fn throttle(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(&req);

    if !state.limiter.allow(&ip, Instant::now()) {
        warn!("rate limit exceeded for {ip}");
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(req).await)
}

/// Client address for throttling: proxy headers first, then the socket
/// peer address.
fn client_ip(req: &Request) -> String {
    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .map(|ip| ip.trim().to_string())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(cap: u32) -> RateLimiter {
        RateLimiter::new(cap, Duration::from_secs(900))
    }

    #[test]
    fn attempts_within_cap_pass() {
        let limiter = limiter(3);
        let t0 = Instant::now();

        for _ in 0..3 {
            assert!(limiter.allow("10.0.0.1", t0));
        }
        assert!(!limiter.allow("10.0.0.1", t0));
    }

    #[test]
    fn denied_attempts_still_count() {
        let limiter = limiter(2);
        let t0 = Instant::now();

        for _ in 0..5 {
            limiter.allow("10.0.0.1", t0);
        }
        // Still inside the window: still blocked.
        assert!(!limiter.allow("10.0.0.1", t0 + Duration::from_secs(10)));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(1);
        let t0 = Instant::now();

        assert!(limiter.allow("10.0.0.1", t0));
        assert!(!limiter.allow("10.0.0.1", t0));
        assert!(limiter.allow("10.0.0.1", t0 + Duration::from_secs(900)));
    }

    #[test]
    fn sources_are_counted_independently() {
        let limiter = limiter(1);
        let t0 = Instant::now();

        assert!(limiter.allow("10.0.0.1", t0));
        assert!(limiter.allow("10.0.0.2", t0));
        assert!(!limiter.allow("10.0.0.1", t0));
    }
}
