//! Repository for the `user_sessions` table.
//!
//! Rows are addressed by token hash; the plaintext cookie value never
//! reaches this layer.

use classifieds_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{NewSession, Session};

const COLUMNS: &str = "id, user_id, token_hash, persistent, user_agent, ip_address, \
                       created_at, expires_at, revoked_at";

/// Predicate for a session that still authenticates.
const LIVE: &str = "revoked_at IS NULL AND expires_at > NOW()";

pub struct SessionRepo;

impl SessionRepo {
    pub async fn insert(pool: &PgPool, input: &NewSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions
                (user_id, token_hash, expires_at, persistent, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .bind(input.persistent)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// The live session for `token_hash`, if any.
    pub async fn find_live(pool: &PgPool, token_hash: &str) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE token_hash = $1 AND {LIVE}");
        sqlx::query_as::<_, Session>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a live session in one statement. Returns its owner when a
    /// session was actually revoked, so two concurrent logouts see exactly
    /// one `Some`.
    pub async fn revoke(pool: &PgPool, token_hash: &str) -> Result<Option<DbId>, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET revoked_at = NOW()
             WHERE token_hash = $1 AND {LIVE}
             RETURNING user_id"
        );
        sqlx::query_scalar::<_, DbId>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke every live session of a user. Returns how many were revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET revoked_at = NOW() WHERE user_id = $1 AND {LIVE}"
        );
        let result = sqlx::query(&query).bind(user_id).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete rows that can no longer authenticate.
    pub async fn purge_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_sessions WHERE revoked_at IS NOT NULL OR expires_at <= NOW()",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
