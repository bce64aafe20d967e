use crate::types::DbId;

/// Generic domain failures shared by every resource.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Failures of the account lifecycle: registration, verification, login
/// and role changes.
///
/// Validation-class variants are recovered at the handler boundary and
/// shown to the user; token variants send the user back to the login flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email address already exists")]
    DuplicateEmail,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Please verify your email address before logging in")]
    EmailNotVerified,

    #[error("Verification token has expired, please request a new verification email")]
    TokenExpired,

    #[error("Invalid verification token")]
    TokenInvalid,

    #[error("Email address is already verified")]
    AlreadyVerified,

    #[error("Invalid role: {0}")]
    InvalidRole(String),
}

impl AuthError {
    /// Stable machine-readable code used in JSON bodies and redirects.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::DuplicateUsername => "DUPLICATE_USERNAME",
            AuthError::DuplicateEmail => "DUPLICATE_EMAIL",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::AlreadyVerified => "ALREADY_VERIFIED",
            AuthError::InvalidRole(_) => "INVALID_ROLE",
        }
    }
}
