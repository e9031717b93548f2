//! Standalone migrator: apply the embedded migration list and exit.
//!
//! Useful for applying schema changes ahead of a deploy instead of at
//! server startup.

use anyhow::Result;
use garland_api::Settings;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&settings.database_url)
        .await?;

    garland_migrate::run(&pool, garland_store::MIGRATIONS).await?;
    info!("migrations up to date");
    Ok(())
}
