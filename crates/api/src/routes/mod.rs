pub mod admin;
pub mod ads;
pub mod auth;
pub mod health;
pub mod images;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register, /auth/login, /auth/logout       account lifecycle
/// /auth/resend-verification                        re-send the link
/// /auth/me, /auth/profile, /auth/password          the caller's account
///
/// /ads                                             list, create
/// /ads/mine                                        caller's ads
/// /ads/{id}                                        get, update, delete
///
/// /admin/users                                     list, create (admin only)
/// /admin/users/{id}                                get, update, delete
/// /admin/users/{id}/role                           change role
/// ```
///
/// `/health`, `/image/{id}` and `/auth/verify-email/{token}` live at the
/// root; see [`crate::router::build_app_router`].
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/ads", ads::router())
        .nest("/admin", admin::router())
}
