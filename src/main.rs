// src/main.rs

use std::time::Duration;

use thpt_exam::config::Config;
use thpt_exam::database;
use thpt_exam::error::AppError;
use thpt_exam::routes;
use thpt_exam::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How often graded sessions are dropped from memory.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration from environment (.env included)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let pool = database::connect(&config.database_url).await?;
    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    database::MIGRATOR.run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    if let Err(e) = database::seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {}", e);
    }

    let state = AppState::new(pool, config.clone());

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.sweep_delivered();
            if removed > 0 {
                tracing::debug!(
                    "Dropped {} graded sessions, {} live",
                    removed,
                    sessions.live_count()
                );
            }
        }
    });

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_address)
        .await
        .map_err(|e| AppError::Config(format!("Cannot bind {}: {}", config.server_address, e)))?;
    tracing::info!("Listening on {}", config.server_address);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}
