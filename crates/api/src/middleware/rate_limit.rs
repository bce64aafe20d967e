//! Fixed-window rate limiting keyed by client address.
//!
//! Two limiters share one implementation: a tight per-minute window on the
//! login, register and resend-verification endpoints ([`AuthRateLimit`]),
//! and loose hourly and daily windows on every request
//! ([`global_rate_limit`]). A request must fit in both global windows.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

/// Hard cap on tracked client keys before stale windows are pruned.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Rate limit settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per minute per client on the auth endpoints.
    pub auth_per_minute: u32,
    /// Requests per hour per client across all routes.
    pub global_per_hour: u32,
    /// Requests per day per client across all routes.
    pub global_per_day: u32,
}

impl RateLimitConfig {
    /// Load rate limits from environment variables.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `AUTH_RATE_LIMIT_PER_MINUTE` | `10`    |
    /// | `GLOBAL_RATE_LIMIT_PER_HOUR` | `5000`  |
    /// | `GLOBAL_RATE_LIMIT_PER_DAY`  | `20000` |
    pub fn from_env() -> Self {
        let auth_per_minute: u32 = std::env::var("AUTH_RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("AUTH_RATE_LIMIT_PER_MINUTE must be a valid u32");

        let global_per_hour: u32 = std::env::var("GLOBAL_RATE_LIMIT_PER_HOUR")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("GLOBAL_RATE_LIMIT_PER_HOUR must be a valid u32");

        let global_per_day: u32 = std::env::var("GLOBAL_RATE_LIMIT_PER_DAY")
            .unwrap_or_else(|_| "20000".into())
            .parse()
            .expect("GLOBAL_RATE_LIMIT_PER_DAY must be a valid u32");

        Self {
            auth_per_minute,
            global_per_hour,
            global_per_day,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// In-memory fixed-window counter per client key.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub fn per_hour(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(3600))
    }

    pub fn per_day(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(86_400))
    }

    /// Count a request from `key`, rejecting it once the window is full.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), AppError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if state.len() >= MAX_TRACKED_CLIENTS && !state.contains_key(key) {
            let window = self.window;
            state.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = state.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.max_requests {
            tracing::warn!(client = key, max = self.max_requests, "Rate limit exceeded");
            return Err(AppError::TooManyRequests);
        }
        entry.count += 1;
        Ok(())
    }
}

/// Best-effort client key: the peer address when the server was started
/// with connect info, else the first `X-Forwarded-For` hop.
pub fn client_key(parts: &Parts) -> String {
    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Extractor that charges the request against the auth endpoint limit.
///
/// Place it first in the handler's argument list so a limited request is
/// rejected before any other work.
pub struct AuthRateLimit;

impl FromRequestParts<AppState> for AuthRateLimit {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.auth_limiter.check(&client_key(parts))?;
        Ok(AuthRateLimit)
    }
}

/// Middleware applying the global per-client limits to every route.
pub async fn global_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let key = client_key(&parts);
    state.global_limiter.check(&key)?;
    state.daily_limiter.check(&key)?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}
