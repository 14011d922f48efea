use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

pub type DatabasePool = Arc<PgPool>;

pub async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    // SQLx with native-tls uses TLS when DATABASE_URL carries sslmode=require.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(config.database_acquire_timeout_secs))
        .connect(&config.database_url)
        .await?;

    let url = &config.database_url;
    if url.contains("sslmode=require") || url.contains("sslmode=prefer") {
        tracing::info!("Database connection configured to use TLS");
    } else if !url.contains("localhost") && !url.contains("127.0.0.1") {
        tracing::warn!(
            "Connecting to remote database without explicit sslmode. Consider adding sslmode=require"
        );
    }

    Ok(pool)
}

pub async fn new_pool(config: &Config) -> anyhow::Result<DatabasePool> {
    let pool = create_pool(config).await?;
    Ok(Arc::new(pool))
}

/// Apply the embedded migrations under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
