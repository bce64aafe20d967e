//! Cookie-backed sessions.
//!
//! The browser holds an opaque random token in an `HttpOnly` cookie; only its
//! SHA-256 hash is stored in `user_sessions`, so a database leak does not
//! expose live sessions. Every request resolves the cookie back to an
//! [`Identity`] with one session lookup and one user lookup.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use classifieds_core::permissions::Identity;
use classifieds_core::types::DbId;
use classifieds_db::models::session::NewSession;
use classifieds_db::repositories::{SessionRepo, UserRepo};
use classifieds_db::DbPool;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Default lifetime of a session without "remember me".
const DEFAULT_TTL_HOURS: i64 = 24;
/// Default lifetime of a remembered session.
const DEFAULT_REMEMBER_DAYS: i64 = 7;

/// Session cookie configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie name (default: `session`).
    pub cookie_name: String,
    /// Emit the `Secure` attribute (on when `APP_ENV=production`).
    pub secure: bool,
    /// Server-side lifetime of a browser-session cookie.
    pub ttl_hours: i64,
    /// Lifetime of a remembered session, server-side and `Max-Age`.
    pub remember_days: i64,
}

impl SessionConfig {
    /// Load session configuration from environment variables.
    ///
    /// | Env Var               | Default       |
    /// |-----------------------|---------------|
    /// | `APP_ENV`             | `development` |
    /// | `SESSION_COOKIE_NAME` | `session`     |
    /// | `SESSION_TTL_HOURS`   | `24`          |
    /// | `REMEMBER_DAYS`       | `7`           |
    pub fn from_env() -> Self {
        let secure = std::env::var("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let cookie_name =
            std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session".into());

        let ttl_hours: i64 = std::env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| DEFAULT_TTL_HOURS.to_string())
            .parse()
            .expect("SESSION_TTL_HOURS must be a valid i64");

        let remember_days: i64 = std::env::var("REMEMBER_DAYS")
            .unwrap_or_else(|_| DEFAULT_REMEMBER_DAYS.to_string())
            .parse()
            .expect("REMEMBER_DAYS must be a valid i64");

        Self {
            cookie_name,
            secure,
            ttl_hours,
            remember_days,
        }
    }

    /// When a session opened at `now` stops being valid.
    pub fn expires_at(&self, remember: bool, now: DateTime<Utc>) -> DateTime<Utc> {
        if remember {
            now + Duration::days(self.remember_days)
        } else {
            now + Duration::hours(self.ttl_hours)
        }
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Generate a random session token.
///
/// Returns `(plaintext, sha256_hex_hash)`. The plaintext goes into the
/// cookie; only the hash is persisted.
pub fn generate_session_token() -> (String, String) {
    let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let hash = hash_session_token(&plaintext);
    (plaintext, hash)
}

/// SHA-256 hex digest of a session token.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Cookies
// ---------------------------------------------------------------------------

/// `Set-Cookie` value establishing a session.
///
/// Remembered sessions carry `Max-Age` and survive browser restarts; others
/// are browser-session cookies.
pub fn session_cookie(config: &SessionConfig, token: &str, remember: bool) -> String {
    let mut cookie = format!("{}={token}; HttpOnly; SameSite=Lax; Path=/", config.cookie_name);
    if remember {
        let max_age = Duration::days(config.remember_days).num_seconds();
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        config.cookie_name
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Read the session token from the request's `Cookie` headers.
pub fn read_session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Client details recorded alongside a new session.
#[derive(Debug, Default, Clone)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Persist a new session for `user_id` and return the plaintext token.
pub async fn open_session(
    pool: &DbPool,
    config: &SessionConfig,
    user_id: DbId,
    remember: bool,
    client: ClientInfo,
) -> Result<String, sqlx::Error> {
    let (token, token_hash) = generate_session_token();
    let input = NewSession {
        user_id,
        token_hash,
        expires_at: config.expires_at(remember, Utc::now()),
        persistent: remember,
        user_agent: client.user_agent,
        ip_address: client.ip_address,
    };
    SessionRepo::insert(pool, &input).await?;
    Ok(token)
}

/// Revoke the session behind `token`. Returns the owning user id if a live
/// session was revoked.
pub async fn close_session(pool: &DbPool, token: &str) -> Result<Option<DbId>, sqlx::Error> {
    SessionRepo::revoke(pool, &hash_session_token(token)).await
}

/// Resolve a session token to the identity behind it.
///
/// Unknown, expired or revoked tokens and deleted users all resolve to
/// [`Identity::Anonymous`].
pub async fn resolve_identity(pool: &DbPool, token: &str) -> Result<Identity, sqlx::Error> {
    let hash = hash_session_token(token);
    let Some(session) = SessionRepo::find_live(pool, &hash).await? else {
        return Ok(Identity::Anonymous);
    };
    let identity = UserRepo::find_by_id(pool, session.user_id)
        .await?
        .map_or(Identity::Anonymous, |user| Identity::user(user.id, user.role));
    Ok(identity)
}
