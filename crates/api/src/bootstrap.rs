//! Seed administrator account.
//!
//! On startup, when `ADMIN_USERNAME` and `ADMIN_PASSWORD_HASH` are set and
//! no account with that username exists, a verified admin is inserted with
//! the given pre-computed hash. An existing account is never modified.

use classifieds_core::roles::Role;
use classifieds_db::models::user::CreateUser;
use classifieds_db::repositories::UserRepo;
use classifieds_db::DbPool;

use crate::auth::password::is_phc_hash;
use crate::error::{AppError, AppResult};

/// Default email of the seed admin.
const DEFAULT_ADMIN_EMAIL: &str = "admin@classifieds.local";

/// Seed admin credentials.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; the plaintext password never reaches the server.
    pub password_hash: String,
}

impl AdminSeed {
    /// Load the seed admin from environment variables.
    ///
    /// | Env Var               | Required | Default                    |
    /// |-----------------------|----------|----------------------------|
    /// | `ADMIN_USERNAME`      | no       | --                         |
    /// | `ADMIN_PASSWORD_HASH` | no       | --                         |
    /// | `ADMIN_EMAIL`         | no       | `admin@classifieds.local`  |
    ///
    /// Returns `None` unless both username and hash are set.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("ADMIN_USERNAME").ok()?;
        let password_hash = std::env::var("ADMIN_PASSWORD_HASH").ok()?;
        Some(Self {
            username,
            email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.into()),
            password_hash,
        })
    }
}

/// Insert the seed admin if missing. Returns `true` when an account was created.
pub async fn ensure_admin(pool: &DbPool, seed: &AdminSeed) -> AppResult<bool> {
    if UserRepo::find_by_username(pool, &seed.username)
        .await?
        .is_some()
    {
        tracing::debug!(username = %seed.username, "Seed admin already exists");
        return Ok(false);
    }
    if !is_phc_hash(&seed.password_hash) {
        return Err(AppError::InternalError(
            "ADMIN_PASSWORD_HASH is not a valid PHC hash string".into(),
        ));
    }

    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password_hash: seed.password_hash.clone(),
            role: Role::Admin,
            email_verified: true,
        },
    )
    .await
    .map_err(AppError::from_user_write)?;

    tracing::info!(user_id = user.id, username = %user.username, "Seed admin created");
    Ok(true)
}
