//! Email verification tokens.
//!
//! A token is an HS256-signed JWT carrying the user id, the issue time and a
//! fixed `purpose` claim. Nothing is stored server-side: the age check runs
//! against the clock at redemption time, and reuse after success is blocked
//! by the account's verified flag rather than by the token itself.

use classifieds_core::error::AuthError;
use classifieds_core::types::DbId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Value of the `purpose` claim; tokens minted for anything else are rejected.
pub const EMAIL_VERIFICATION_PURPOSE: &str = "email_verification";

/// Default validity window: one hour.
pub const DEFAULT_MAX_AGE_SECS: i64 = 3600;

/// Claims embedded in every verification token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerificationClaims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Always [`EMAIL_VERIFICATION_PURPOSE`].
    pub purpose: String,
}

/// Signing configuration for verification tokens.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Process-wide HMAC secret.
    pub secret: String,
    /// Maximum token age in seconds.
    pub max_age_secs: i64,
}

impl TokenConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default |
    /// |-----------------------------|----------|---------|
    /// | `SECRET_KEY`                | **yes**  | --      |
    /// | `VERIFICATION_MAX_AGE_SECS` | no       | `3600`  |
    ///
    /// # Panics
    ///
    /// Panics if `SECRET_KEY` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("SECRET_KEY").expect("SECRET_KEY must be set in the environment");
        assert!(!secret.is_empty(), "SECRET_KEY must not be empty");

        let max_age_secs: i64 = std::env::var("VERIFICATION_MAX_AGE_SECS")
            .unwrap_or_else(|_| DEFAULT_MAX_AGE_SECS.to_string())
            .parse()
            .expect("VERIFICATION_MAX_AGE_SECS must be a valid i64");

        Self {
            secret,
            max_age_secs,
        }
    }
}

/// Issue a verification token for `user_id`, stamped with the current time.
pub fn issue(user_id: DbId, config: &TokenConfig) -> Result<String, jsonwebtoken::errors::Error> {
    issue_at(user_id, chrono::Utc::now().timestamp(), config)
}

/// Issue a token with an explicit issue time.
pub fn issue_at(
    user_id: DbId,
    issued_at: i64,
    config: &TokenConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = VerificationClaims {
        sub: user_id,
        iat: issued_at,
        purpose: EMAIL_VERIFICATION_PURPOSE.to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify a token against the current time and return the user id it names.
pub fn verify(token: &str, config: &TokenConfig) -> Result<DbId, AuthError> {
    verify_at(token, chrono::Utc::now().timestamp(), config)
}

/// Verify a token as of `now` (UTC Unix timestamp).
///
/// - Bad signature, undecodable payload or foreign purpose: [`AuthError::TokenInvalid`].
/// - Older than `config.max_age_secs`: [`AuthError::TokenExpired`].
pub fn verify_at(token: &str, now: i64, config: &TokenConfig) -> Result<DbId, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is derived from `iat` and the configured window, not from `exp`.
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let claims = decode::<VerificationClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::TokenInvalid)?
    .claims;

    if claims.purpose != EMAIL_VERIFICATION_PURPOSE {
        return Err(AuthError::TokenInvalid);
    }
    if now - claims.iat > config.max_age_secs {
        return Err(AuthError::TokenExpired);
    }
    Ok(claims.sub)
}
