//! Bounded PostgreSQL connection pool.

use crate::config::AppConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

fn pool_options(config: &AppConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(config.acquire_timeout)
}

/// Connects and pings the database once so misconfiguration fails at startup.
pub async fn connect(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(config).connect(&config.database_url).await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "connected to PostgreSQL"
    );
    Ok(pool)
}

/// Pool that opens connections on first use.
pub fn connect_lazy(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(config).connect_lazy(&config.database_url)
}
