//! User entity model and DTOs.

use classifieds_core::roles::Role;
use classifieds_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub profile_image_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub profile_image_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            email_verified: user.email_verified,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            profile_image_id: user.profile_image_id,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
///
/// Self-registration always uses `Role::User` and `email_verified: false`;
/// administrators and the seed account may set both.
#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
}

/// DTO for a profile update.
///
/// Missing name/phone fields are stored as empty strings. A missing
/// `profile_image_id` leaves the current image untouched.
#[derive(Debug, Default)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub profile_image_id: Option<DbId>,
}

/// DTO for the administrator edit form. The password hash is only replaced
/// when `password_hash` is `Some`.
#[derive(Debug)]
pub struct UpdateAccount {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub password_hash: Option<String>,
}
