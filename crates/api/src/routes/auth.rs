//! Route definitions for the `/auth` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/api/v1/auth`.
///
/// ```text
/// POST /register             -> register (rate limited)
/// POST /login                -> login (rate limited)
/// POST /logout               -> logout
/// POST /resend-verification  -> resend_verification (rate limited)
/// GET  /me                   -> me
/// GET  /profile              -> get_profile (requires auth)
/// PUT  /profile              -> update_profile (requires auth, multipart)
/// PUT  /password             -> change_password (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/resend-verification", post(auth::resend_verification))
        .route("/me", get(auth::me))
        .route(
            "/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/password", put(auth::change_password))
}

/// The verification link target, mounted at the root because it is opened
/// from an email rather than called by the frontend.
///
/// ```text
/// GET /auth/verify-email/{token} -> verify_email (303 to the login page)
/// ```
pub fn verify_router() -> Router<AppState> {
    Router::new().route("/auth/verify-email/{token}", get(auth::verify_email))
}
