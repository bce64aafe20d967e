use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when a dependency is down.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// The outbound email worker is accepting messages.
    pub mail_queue: bool,
}

/// GET /health
///
/// 503 when the database is unreachable. A stopped mail worker only
/// degrades the status.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_healthy = classifieds_db::health_check(&state.pool).await.is_ok();
    let mail_queue = state.email.is_running();

    if !db_healthy {
        tracing::warn!("Health check: database unreachable");
    }
    if !mail_queue {
        tracing::warn!("Health check: email worker stopped");
    }

    let code = if db_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = HealthResponse {
        status: if db_healthy && mail_queue { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        mail_queue,
    };
    (code, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
