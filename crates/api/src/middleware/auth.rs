//! Session-cookie identity extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use classifieds_core::error::CoreError;
use classifieds_core::permissions::Identity;
use classifieds_core::roles::Role;
use classifieds_core::types::DbId;

use super::rate_limit::client_key;
use crate::auth::session::{read_session_cookie, resolve_identity, ClientInfo};
use crate::error::AppError;
use crate::state::AppState;

/// The identity behind the current request, anonymous or not.
///
/// Resolved from the session cookie once per request and cached in the
/// request extensions, so several extractors on one handler share a
/// single lookup. Never cached across requests.
#[derive(Debug, Clone, Copy)]
pub struct CurrentIdentity(pub Identity);

impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(CurrentIdentity(*identity));
        }

        let identity = match read_session_cookie(&parts.headers, &state.config.session.cookie_name)
        {
            Some(token) => resolve_identity(&state.pool, &token).await?,
            None => Identity::Anonymous,
        };

        parts.extensions.insert(identity);
        Ok(CurrentIdentity(identity))
    }
}

/// Authenticated user. Rejects anonymous requests with 401.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: Role,
}

impl AuthUser {
    pub fn identity(&self) -> Identity {
        Identity::user(self.user_id, self.role)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;
        match identity {
            Identity::User { user_id, role } => Ok(AuthUser { user_id, role }),
            Identity::Anonymous => Err(AppError::Core(CoreError::Unauthorized(
                "Authentication required".into(),
            ))),
        }
    }
}

/// Client details recorded on new sessions. Never rejects.
impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let ip_address = Some(client_key(parts)).filter(|key| key != "unknown");
        Ok(ClientInfo {
            user_agent,
            ip_address,
        })
    }
}
