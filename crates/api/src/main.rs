use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classifieds_api::background;
use classifieds_api::bootstrap::{ensure_admin, AdminSeed};
use classifieds_api::config::ServerConfig;
use classifieds_api::middleware::rate_limit::RateLimiter;
use classifieds_api::router::build_app_router;
use classifieds_api::state::AppState;
use classifieds_events::dispatch::DEFAULT_QUEUE_CAPACITY;
use classifieds_events::{
    AuditLog, EmailConfig, EmailDelivery, EmailDispatcher, EventBus, LogMailer, Mailer,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classifieds_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = classifieds_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    classifieds_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    classifieds_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Seed admin ---
    if let Some(seed) = AdminSeed::from_env() {
        match ensure_admin(&pool, &seed).await {
            Ok(true) => tracing::info!(username = %seed.username, "Seed admin created"),
            Ok(false) => {}
            Err(e) => tracing::error!(error = %e, "Failed to create seed admin"),
        }
    }

    let cancel = CancellationToken::new();

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let audit_handle = tokio::spawn(AuditLog::run(event_bus.subscribe(), cancel.clone()));

    // --- Email dispatcher ---
    let mailer: Arc<dyn Mailer> = match EmailConfig::from_env() {
        Some(email_config) => match EmailDelivery::new(email_config) {
            Ok(delivery) => Arc::new(delivery),
            Err(e) => {
                tracing::error!(error = %e, "SMTP transport misconfigured, logging emails instead");
                Arc::new(LogMailer)
            }
        },
        None => {
            tracing::warn!("SMTP_HOST not set, logging emails instead of sending");
            Arc::new(LogMailer)
        }
    };
    let (email, email_handle) =
        EmailDispatcher::start(mailer, DEFAULT_QUEUE_CAPACITY, cancel.clone());

    // --- Session cleanup ---
    let cleanup_handle = tokio::spawn(background::session_cleanup::run(
        pool.clone(),
        cancel.clone(),
    ));

    tracing::info!("Background services started (audit log, email dispatcher, session cleanup)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        email,
        auth_limiter: Arc::new(RateLimiter::per_minute(config.rate_limit.auth_per_minute)),
        global_limiter: Arc::new(RateLimiter::per_hour(config.rate_limit.global_per_hour)),
        daily_limiter: Arc::new(RateLimiter::per_day(config.rate_limit.global_per_day)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    for (name, handle) in [
        ("email dispatcher", email_handle),
        ("session cleanup", cleanup_handle),
        ("audit log", audit_handle),
    ] {
        if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
            tracing::warn!(task = name, "Background task did not stop in time");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
