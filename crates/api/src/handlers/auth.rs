//! Handlers for the `/auth` resource: registration, email verification,
//! login/logout, the current identity, and the caller's profile.

use axum::extract::{Multipart, Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use classifieds_core::error::CoreError;
use classifieds_core::fields::{PHONE_MAX_LEN, PROFILE_NAME_MAX_LEN};
use classifieds_core::permissions::Identity;
use classifieds_db::models::user::{UpdateProfile, User, UserResponse};
use classifieds_db::repositories::UserRepo;
use classifieds_events::{DomainEvent, EventKind, Subject};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::accounts;
use crate::auth::session::{
    clear_session_cookie, close_session, open_session, read_session_cookie, session_cookie,
    ClientInfo,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, CurrentIdentity};
use crate::middleware::rate_limit::AuthRateLimit;
use crate::state::AppState;
use crate::upload::{discard_image, read_form, settle_image_write, store_image};

/// Multipart field carrying the profile picture.
const PROFILE_IMAGE_FIELD: &str = "profile_image";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm_password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Keep the session across browser restarts.
    #[serde(default)]
    pub remember: bool,
}

/// Request body for `POST /auth/resend-verification`.
#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// Request body for `PUT /auth/password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "Passwords must match"))]
    pub confirm_password: String,
}

/// Response of `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub identity: Identity,
    pub user: Option<UserResponse>,
}

/// Response of `POST /auth/resend-verification`.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Registration and verification
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an unverified account and queue the verification email.
pub async fn register(
    _limit: AuthRateLimit,
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    input.validate()?;

    let user = accounts::register(&state.pool, input.username, input.email, input.password).await?;

    state.event_bus.publish(
        DomainEvent::new(EventKind::Registered, Subject::User(user.id))
            .by(user.id),
    );
    accounts::queue_verification_email(&state, &user)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /auth/verify-email/{token}
///
/// Always answers with a `303` to the login page; the `message` query
/// parameter is `email_verified` on success or the lowercased error code.
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Redirect> {
    let message = match accounts::verify_email(&state.pool, &state.config.token, &token).await {
        Ok(user) => {
            state.event_bus.publish(
                DomainEvent::new(EventKind::Verified, Subject::User(user.id))
                    .by(user.id),
            );
            "email_verified".to_string()
        }
        Err(AppError::Auth(err)) => {
            tracing::info!(code = err.code(), "Email verification rejected");
            err.code().to_ascii_lowercase()
        }
        Err(other) => return Err(other),
    };
    Ok(Redirect::to(&state.config.login_redirect(&message)))
}

/// POST /api/v1/auth/resend-verification
///
/// Queue a new verification email for an unverified account. Always
/// answers `202` so the endpoint does not reveal which emails exist.
pub async fn resend_verification(
    _limit: AuthRateLimit,
    State(state): State<AppState>,
    Json(input): Json<ResendVerificationRequest>,
) -> AppResult<(StatusCode, Json<AcceptedResponse>)> {
    let email = input.email.trim();
    match UserRepo::find_by_email(&state.pool, email).await? {
        Some(user) if !user.email_verified => accounts::queue_verification_email(&state, &user)?,
        Some(user) => tracing::debug!(user_id = user.id, "Resend skipped, already verified"),
        None => tracing::debug!("Resend skipped, unknown email"),
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            message: "If the address belongs to an unverified account, a new link has been sent",
        }),
    ))
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Check credentials, open a session and set the session cookie. Any
/// session cookie already presented is revoked first.
pub async fn login(
    _limit: AuthRateLimit,
    State(state): State<AppState>,
    client: ClientInfo,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Response> {
    let user = accounts::authenticate(&state.pool, &input.username, &input.password).await?;

    let session_config = &state.config.session;
    if let Some(previous) = read_session_cookie(&headers, &session_config.cookie_name) {
        close_session(&state.pool, &previous).await?;
    }

    let token = open_session(&state.pool, session_config, user.id, input.remember, client).await?;

    state.event_bus.publish(
        DomainEvent::new(EventKind::Login, Subject::User(user.id))
            .by(user.id)
            .detail(serde_json::json!({ "remember": input.remember })),
    );
    tracing::info!(user_id = user.id, remember = input.remember, "User logged in");

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(session_config, &token, input.remember))]),
        Json(UserResponse::from(&user)),
    )
        .into_response())
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented session, if any, and clear the cookie. Idempotent
/// and open to anonymous callers. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let session_config = &state.config.session;
    if let Some(token) = read_session_cookie(&headers, &session_config.cookie_name) {
        if let Some(user_id) = close_session(&state.pool, &token).await? {
            state.event_bus.publish(
                DomainEvent::new(EventKind::Logout, Subject::User(user_id))
                    .by(user_id),
            );
            tracing::info!(user_id, "User logged out");
        }
    }

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, clear_session_cookie(session_config))]),
    )
        .into_response())
}

/// PUT /api/v1/auth/password
///
/// Change the caller's password. Every existing session is revoked and a
/// fresh one is issued to the caller.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    client: ClientInfo,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Response> {
    input.validate()?;
    let user = load_user(&state, auth).await?;

    accounts::change_password(
        &state.pool,
        &user,
        &input.current_password,
        input.new_password,
    )
    .await?;
    state
        .event_bus
        .publish(DomainEvent::new(EventKind::PasswordChanged, Subject::User(user.id)).by(user.id));

    let session_config = &state.config.session;
    let token = open_session(&state.pool, session_config, user.id, false, client).await?;
    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, session_cookie(session_config, &token, false))]),
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Identity and profile
// ---------------------------------------------------------------------------

/// GET /api/v1/auth/me
///
/// The resolved identity; `user` is `null` for anonymous callers.
pub async fn me(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> AppResult<Json<MeResponse>> {
    let user = match identity.user_id() {
        Some(id) => UserRepo::find_by_id(&state.pool, id).await?,
        None => None,
    };
    Ok(Json(MeResponse {
        identity,
        user: user.as_ref().map(UserResponse::from),
    }))
}

/// GET /api/v1/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = load_user(&state, auth).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /api/v1/auth/profile
///
/// Multipart form with `first_name`, `last_name`, `phone` and an optional
/// `profile_image`. Omitted text fields are cleared; a new image replaces
/// the old one, which is deleted best-effort.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<UserResponse>> {
    let form = read_form(&mut multipart, PROFILE_IMAGE_FIELD).await?;

    let first_name = form.text("first_name");
    let last_name = form.text("last_name");
    let phone = form.text("phone");
    check_max_len("first_name", first_name.as_deref(), PROFILE_NAME_MAX_LEN)?;
    check_max_len("last_name", last_name.as_deref(), PROFILE_NAME_MAX_LEN)?;
    check_max_len("phone", phone.as_deref(), PHONE_MAX_LEN)?;

    let current = load_user(&state, auth).await?;

    let new_image_id = match form.image {
        Some(image) => Some(store_image(&state.pool, image).await?),
        None => None,
    };

    let written = UserRepo::update_profile(
        &state.pool,
        current.id,
        &UpdateProfile {
            first_name,
            last_name,
            phone,
            profile_image_id: new_image_id,
        },
    )
    .await;
    let updated = settle_image_write(
        &state.pool,
        new_image_id,
        written,
        CoreError::NotFound {
            entity: "User",
            id: current.id,
        },
    )
    .await?;

    if new_image_id.is_some() {
        discard_image(&state.pool, current.profile_image_id).await;
    }

    tracing::info!(user_id = updated.id, "Profile updated");
    Ok(Json(UserResponse::from(&updated)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load the caller's row. A session whose user vanished mid-request is
/// treated as unauthenticated.
async fn load_user(state: &AppState, auth: AuthUser) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Authentication required".into())))
}

fn check_max_len(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Core(CoreError::Validation(format!(
            "{field} must be at most {max} characters"
        )))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: "ana".into(),
            email: "ana@x.hr".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn register_request_accepts_valid_input() {
        assert!(register_request("secret1", "secret1").validate().is_ok());
    }

    #[test]
    fn register_request_rejects_mismatch_and_short_password() {
        assert!(register_request("secret1", "secret2").validate().is_err());
        assert!(register_request("short", "short").validate().is_err());
    }

    #[test]
    fn register_request_rejects_bad_username_and_email() {
        let mut req = register_request("secret1", "secret1");
        req.username = "ab".into();
        assert!(req.validate().is_err());

        let mut req = register_request("secret1", "secret1");
        req.email = "not-an-email".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn max_len_counts_characters() {
        assert!(check_max_len("x", Some("ćććć"), 4).is_ok());
        assert!(check_max_len("x", Some("ććććć"), 4).is_err());
        assert!(check_max_len("x", None, 0).is_ok());
    }
}
