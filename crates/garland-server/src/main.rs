//! # Garland Server
//!
//! Entry point for the allowlist service: applies schema migrations,
//! starts the proof-index backfill task, and serves the HTTP API.

use std::time::Duration;

use anyhow::Result;
use garland_api::{ApiState, Settings};
use garland_store::TreeStore;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pool size shared by request handlers, the migrator, and the backfill
/// task.
const MAX_DB_CONNECTIONS: u32 = 20;

/// How often the backfill task looks for trees missing index rows.
const BACKFILL_INTERVAL: Duration = Duration::from_secs(1);

fn init_tracing(settings: &Settings) {
    let default_level = if settings.is_production() { "info" } else { "debug" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    init_tracing(&settings);

    let pool = PgPoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect(&settings.database_url)
        .await?;

    garland_migrate::run(&pool, garland_store::MIGRATIONS).await?;

    let store = TreeStore::new(pool);
    tokio::spawn(garland_store::backfill::run(store.clone(), BACKFILL_INTERVAL));

    let listen = settings.listen;
    let git_sha = settings.git_sha.clone();
    let state = ApiState::new(store, settings);
    let app = garland_api::router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(listen = %listen, git_sha = %git_sha, "http server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
