//! Account lifecycle over the credential store.
//!
//! Registration, administrative creation and editing, email verification,
//! login checks and password changes. Handlers stay thin and call into
//! these functions, which return the [`AuthError`] taxonomy wrapped in
//! [`AppError`].

use classifieds_core::error::{AuthError, CoreError};
use classifieds_core::roles::Role;
use classifieds_core::types::DbId;
use classifieds_db::models::user::{CreateUser, UpdateAccount, User};
use classifieds_db::repositories::{SessionRepo, UserRepo};
use classifieds_db::DbPool;
use classifieds_events::messages::verification_email;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::verification::{self, TokenConfig};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Input for creating an account.
#[derive(Debug)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub email_verified: bool,
}

/// Input for the administrator edit form. `password` replaces the stored
/// hash only when present.
#[derive(Debug)]
pub struct AccountEdit {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub password: Option<String>,
}

/// Self-registration: always `Role::User`, always unverified.
pub async fn register(
    pool: &DbPool,
    username: String,
    email: String,
    password: String,
) -> AppResult<User> {
    create_account(
        pool,
        NewAccount {
            username,
            email,
            password,
            role: Role::User,
            email_verified: false,
        },
    )
    .await
}

/// Create an account with an explicit role and verified flag.
///
/// Username is checked before email, so a request reusing both reports
/// [`AuthError::DuplicateUsername`]. A concurrent insert that slips past the
/// checks is caught by the unique constraints and mapped the same way.
pub async fn create_account(pool: &DbPool, input: NewAccount) -> AppResult<User> {
    if UserRepo::find_by_username(pool, &input.username)
        .await?
        .is_some()
    {
        return Err(AuthError::DuplicateUsername.into());
    }
    if UserRepo::find_by_email(pool, &input.email).await?.is_some() {
        return Err(AuthError::DuplicateEmail.into());
    }

    let password_hash = hash_password_blocking(input.password).await?;
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            role: input.role,
            email_verified: input.email_verified,
        },
    )
    .await
    .map_err(AppError::from_user_write)?;

    tracing::info!(user_id = user.id, role = %user.role, "Account created");
    Ok(user)
}

/// Check credentials for login.
///
/// The verified flag is only consulted after the password matched, so an
/// unverified account is indistinguishable from a wrong password unless the
/// caller knows the password.
pub async fn authenticate(pool: &DbPool, username: &str, password: &str) -> AppResult<User> {
    let user = UserRepo::find_by_username(pool, username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let matches =
        verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
    if !matches {
        return Err(AuthError::InvalidCredentials.into());
    }
    if !user.email_verified {
        return Err(AuthError::EmailNotVerified.into());
    }
    Ok(user)
}

/// Redeem a verification token: `Unverified -> Verified`.
///
/// Fails with [`AuthError::AlreadyVerified`] without touching the row when
/// the account is already verified, including when a concurrent request
/// won the race.
pub async fn verify_email(pool: &DbPool, config: &TokenConfig, token: &str) -> AppResult<User> {
    let user_id = verification::verify(token, config)?;

    let user = UserRepo::find_by_id(pool, user_id)
        .await?
        .ok_or(AuthError::TokenInvalid)?;
    if user.email_verified {
        return Err(AuthError::AlreadyVerified.into());
    }

    let verified = UserRepo::set_verified(pool, user_id)
        .await?
        .ok_or(AuthError::AlreadyVerified)?;
    tracing::info!(user_id, "Email verified");
    Ok(verified)
}

/// Issue a fresh token for `user` and queue the verification email.
///
/// Returns immediately; delivery happens on the dispatcher worker and its
/// outcome is never reported back.
pub fn queue_verification_email(state: &AppState, user: &User) -> AppResult<()> {
    let token = verification::issue(user.id, &state.config.token)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let url = state.config.verification_url(&token);
    let queued = state
        .email
        .enqueue(verification_email(&user.email, &user.username, &url));
    tracing::debug!(user_id = user.id, queued, "Verification email handed to dispatcher");
    Ok(())
}

/// Change a user's role from its textual form.
pub async fn change_role(pool: &DbPool, user_id: DbId, role: &str) -> AppResult<Role> {
    let role: Role = role.parse()?;
    if !UserRepo::update_role(pool, user_id, role).await? {
        return Err(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }
        .into());
    }
    tracing::info!(user_id, role = %role, "Role changed");
    Ok(role)
}

/// Apply the administrator edit form.
///
/// Username and email must not collide with any *other* account.
pub async fn update_account(pool: &DbPool, user_id: DbId, input: AccountEdit) -> AppResult<User> {
    if let Some(other) =
        UserRepo::find_conflicting(pool, user_id, &input.username, &input.email).await?
    {
        return Err(if other.username == input.username {
            AuthError::DuplicateUsername.into()
        } else {
            AuthError::DuplicateEmail.into()
        });
    }

    let password_hash = match input.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password_blocking(password).await?),
        None => None,
    };

    let edit = UpdateAccount {
        username: input.username,
        email: input.email,
        role: input.role,
        email_verified: input.email_verified,
        password_hash,
    };
    UserRepo::update_account(pool, user_id, &edit)
        .await
        .map_err(AppError::from_user_write)?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "User",
                id: user_id,
            }
            .into()
        })
}

/// Replace the caller's password after re-checking the current one.
///
/// All of the user's sessions are revoked; the caller opens a fresh one.
pub async fn change_password(
    pool: &DbPool,
    user: &User,
    current_password: &str,
    new_password: String,
) -> AppResult<()> {
    let matches =
        verify_password_blocking(current_password.to_string(), user.password_hash.clone())
            .await?;
    if !matches {
        return Err(AuthError::InvalidCredentials.into());
    }

    let hash = hash_password_blocking(new_password).await?;
    UserRepo::set_password(pool, user.id, &hash).await?;
    let revoked = SessionRepo::revoke_all_for_user(pool, user.id).await?;
    tracing::info!(user_id = user.id, revoked, "Password changed");
    Ok(())
}
