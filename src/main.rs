//! TestForge API - Coding Test Platform
//!
//! Teachers author programming tests, students submit solutions, and
//! submissions are auto-graded against per-question test cases by a Judge0
//! instance. Aggregate activity is exposed as heatmap analytics.
//!
//! Startup is deliberately fail-fast: the service must not serve traffic
//! without a working database connection, so a failed connect logs the error
//! and exits with status 1.

mod auth;
mod config;
mod db;
mod error;
mod grading;
mod models;
mod routes;
mod state;

use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting TestForge - Coding Test Platform...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    if std::env::var("JWT_SECRET").is_err() {
        warn!("⚠️  JWT_SECRET not set, using default (INSECURE - set in production!)");
    }
    if settings.grading.api_key.is_none() {
        warn!("⚠️  JUDGE0_API_KEY not set, grading requests will be unauthenticated");
    }

    // Establish the database connection - REQUIRED, fail-fast on error
    let database = match db::connect(&settings.database).await {
        Ok(database) => {
            info!("✅ Database connected successfully");
            database
        }
        Err(e) => {
            error!("❌ Database connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Create indexes if they don't exist
    if let Err(e) = db::ensure_indexes(&database).await {
        warn!("⚠️  Warning creating indexes: {}", e);
    }

    let state = Arc::new(AppState::new(database, &settings.grading));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Accounts ───");
    info!("   POST /auth/register       - Register student/teacher account");
    info!("   POST /auth/login          - Login with email/password");
    info!("   POST /auth/refresh        - Refresh access token");
    info!("");
    info!("   ─── Tests ───");
    info!("   GET  /get-languages       - List supported languages");
    info!("   POST /create-test         - Create a test (teacher)");
    info!("   GET  /tests               - List all tests");
    info!("   GET  /student-tests       - Taken tests with scores (student)");
    info!("   GET  /teacher-tests       - Authored tests (teacher)");
    info!("   POST /submit/:testId      - Submit and grade answers (student)");
    info!("   GET  /heatmap             - Submission activity heatmap");
    info!("   GET  /:testId             - Fetch a single test");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,testforge_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
