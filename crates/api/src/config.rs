use crate::auth::session::SessionConfig;
use crate::auth::verification::TokenConfig;
use crate::middleware::rate_limit::RateLimitConfig;

/// Default cap on request bodies (covers multipart image uploads).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except the signing secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Externally visible base URL, used to build verification links.
    pub public_base_url: String,
    /// Where email verification attempts redirect to.
    pub login_page_url: String,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// Verification token signing configuration.
    pub token: TokenConfig,
    /// Session cookie configuration.
    pub session: SessionConfig,
    /// Fixed-window rate limits.
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:3000`    |
    /// | `LOGIN_PAGE_URL`       | `/login`                   |
    /// | `MAX_UPLOAD_BYTES`     | `5242880`                  |
    ///
    /// Token, session and rate-limit settings are documented on
    /// [`TokenConfig::from_env`], [`SessionConfig::from_env`] and
    /// [`RateLimitConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but cannot be parsed, or if `SECRET_KEY`
    /// is missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let login_page_url = std::env::var("LOGIN_PAGE_URL").unwrap_or_else(|_| "/login".into());

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_base_url,
            login_page_url,
            max_upload_bytes,
            token: TokenConfig::from_env(),
            session: SessionConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
        }
    }

    /// Absolute link embedded in verification emails.
    pub fn verification_url(&self, token: &str) -> String {
        format!("{}/auth/verify-email/{token}", self.public_base_url)
    }

    /// Redirect target for a verification outcome, e.g. `/login?message=email_verified`.
    pub fn login_redirect(&self, message: &str) -> String {
        let separator = if self.login_page_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}message={message}", self.login_page_url)
    }
}
