use std::sync::Arc;

use classifieds_events::{EmailDispatcher, EventBus};

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: classifieds_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus for identity changes and domain events.
    pub event_bus: Arc<EventBus>,
    /// Queue handle for fire-and-forget outbound email.
    pub email: EmailDispatcher,
    /// Per-client limiter for the login/register/resend endpoints.
    pub auth_limiter: Arc<RateLimiter>,
    /// Per-client hourly limiter applied to every request.
    pub global_limiter: Arc<RateLimiter>,
    /// Per-client daily limiter applied to every request.
    pub daily_limiter: Arc<RateLimiter>,
}
