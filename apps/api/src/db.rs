use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Creates the PostgreSQL connection pool and brings the schema up to date.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to apply database migrations")?;

    info!("PostgreSQL connection pool established, migrations applied");
    Ok(pool)
}
