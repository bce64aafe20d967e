use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use classifieds_core::error::{AuthError, CoreError};
use classifieds_db::repositories::user_repo::{UQ_EMAIL, UQ_USERNAME};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`AuthError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// `{"error", "code"}` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `classifieds_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An account lifecycle error (registration, login, verification).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A resource addressed by an unparseable or unknown key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller exceeded a rate limit.
    #[error("Too many requests")]
    TooManyRequests,

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Translate a unique violation on the user constraints into the
    /// matching [`AuthError`]; every other error is wrapped unchanged.
    pub fn from_user_write(err: sqlx::Error) -> Self {
        match violated_user_constraint(&err) {
            Some(auth) => AppError::Auth(auth),
            None => AppError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            },

            // --- AuthError variants ---
            AppError::Auth(auth) => (auth_status(auth), auth.code(), auth.to_string()),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests, please try again later".to_string(),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// HTTP status for each account lifecycle failure.
fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::DuplicateUsername | AuthError::DuplicateEmail | AuthError::AlreadyVerified => {
            StatusCode::CONFLICT
        }
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
        AuthError::TokenExpired | AuthError::TokenInvalid | AuthError::InvalidRole(_) => {
            StatusCode::BAD_REQUEST
        }
    }
}

/// Map a unique violation on `users.username` / `users.email` to its
/// [`AuthError`].
fn violated_user_constraint(err: &sqlx::Error) -> Option<AuthError> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    match db_err.constraint() {
        Some(UQ_USERNAME) => Some(AuthError::DuplicateUsername),
        Some(UQ_EMAIL) => Some(AuthError::DuplicateEmail),
        _ => None,
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on the user constraints map to their [`AuthError`].
/// - Other unique violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    if let Some(auth) = violated_user_constraint(err) {
        return (auth_status(&auth), auth.code(), auth.to_string());
    }
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn auth_errors_map_to_documented_statuses() {
        assert_eq!(status_of(AuthError::DuplicateUsername.into()), StatusCode::CONFLICT);
        assert_eq!(status_of(AuthError::DuplicateEmail.into()), StatusCode::CONFLICT);
        assert_eq!(status_of(AuthError::AlreadyVerified.into()), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthError::EmailNotVerified.into()), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthError::TokenExpired.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AuthError::TokenInvalid.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AuthError::InvalidRole("owner".into()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn core_errors_map_to_documented_statuses() {
        assert_eq!(
            status_of(CoreError::Forbidden("no".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(CoreError::NotFound { entity: "Ad", id: 1 }.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CoreError::Unauthorized("who".into()).into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn http_variants_map_to_documented_statuses() {
        assert_eq!(status_of(AppError::TooManyRequests), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_of(AppError::NotFound("image".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(sqlx::Error::RowNotFound.into()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn non_database_errors_pass_through_user_write_mapping() {
        let err = AppError::from_user_write(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
