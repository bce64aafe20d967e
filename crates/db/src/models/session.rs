//! Server-side session rows.

use classifieds_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// One login, as stored in `user_sessions`.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    /// SHA-256 hex of the cookie token.
    pub token_hash: String,
    /// Set for "remember me" logins.
    pub persistent: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
}

/// Input for [`SessionRepo::insert`](crate::repositories::SessionRepo::insert).
#[derive(Debug)]
pub struct NewSession {
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub persistent: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
