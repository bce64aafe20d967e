#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use classifieds_api::auth::password::hash_password;
use classifieds_api::auth::session::SessionConfig;
use classifieds_api::auth::verification::TokenConfig;
use classifieds_api::config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use classifieds_api::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use classifieds_api::router::build_app_router;
use classifieds_api::state::AppState;
use classifieds_core::roles::Role;
use classifieds_db::models::user::{CreateUser, User};
use classifieds_db::repositories::UserRepo;
use classifieds_events::{EmailDispatcher, EventBus, LogMailer};

/// Password given to every user created by [`create_user`].
pub const TEST_PASSWORD: &str = "secret1";

/// Build a test `ServerConfig` with safe defaults.
///
/// Rate limits are set high enough that ordinary tests never trip them.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        public_base_url: "http://localhost:3000".to_string(),
        login_page_url: "/login".to_string(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        token: TokenConfig {
            secret: "test-secret-key".to_string(),
            max_age_secs: 3600,
        },
        session: SessionConfig {
            cookie_name: "session".to_string(),
            secure: false,
            ttl_hours: 24,
            remember_days: 7,
        },
        rate_limit: RateLimitConfig {
            auth_per_minute: 1000,
            global_per_hour: 100_000,
            global_per_day: 100_000,
        },
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Same as [`build_test_app`] with a caller-supplied configuration.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    assemble(pool, config, Arc::new(EventBus::default()))
}

/// The test app plus the event bus its handlers publish to.
pub fn build_test_app_with_bus(pool: PgPool) -> (Router, Arc<EventBus>) {
    let bus = Arc::new(EventBus::default());
    (assemble(pool, test_config(), bus.clone()), bus)
}

fn assemble(pool: PgPool, config: ServerConfig, event_bus: Arc<EventBus>) -> Router {
    let (email, _worker) =
        EmailDispatcher::start(Arc::new(LogMailer), 16, CancellationToken::new());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus,
        email,
        auth_limiter: Arc::new(RateLimiter::per_minute(config.rate_limit.auth_per_minute)),
        global_limiter: Arc::new(RateLimiter::per_hour(config.rate_limit.global_per_hour)),
        daily_limiter: Arc::new(RateLimiter::per_day(config.rate_limit.global_per_day)),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user directly with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str, role: Role, verified: bool) -> User {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@x.hr"),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        role,
        email_verified: verified,
    };
    UserRepo::create(pool, &input).await.unwrap()
}

/// Log in through the API and return the `name=value` cookie pair.
pub async fn login(app: &Router, username: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        None,
        serde_json::json!({ "username": username, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 200, "login as {username} should succeed");
    session_cookie(&response).expect("login must set the session cookie")
}

/// The `name=value` pair of the response's `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

/// The raw `Set-Cookie` header value.
pub fn set_cookie_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn builder(method: Method, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match cookie {
        Some(cookie) => builder.header(COOKIE, cookie),
        None => builder,
    }
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    send(app, builder(Method::GET, uri, cookie).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    send(app, builder(Method::DELETE, uri, cookie).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, cookie: Option<&str>, body: Value) -> Response<Body> {
    json_request(app, Method::POST, uri, cookie, body).await
}

pub async fn put_json(app: &Router, uri: &str, cookie: Option<&str>, body: Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, cookie, body).await
}

async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Value,
) -> Response<Body> {
    let request = builder(method, uri, cookie)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Minimal PNG signature; enough for format sniffing.
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
];

const BOUNDARY: &str = "classifieds-test-boundary";

/// Send a `multipart/form-data` request with text fields and an optional
/// file part `(field_name, filename, bytes)`.
pub async fn multipart(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Response<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = builder(method, uri, cookie)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
