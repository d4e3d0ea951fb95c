//! Storage access: repository ports and their PostgreSQL implementations.
//!
//! Everything above this module consumes the ports only; concrete
//! repositories are injected at construction time, never reached through a
//! process-wide singleton.

pub mod infrastructure;
pub mod ports;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Result;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Open a connection pool against the configured database.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;
    Ok(pool)
}

/// Open a pool and bring the schema up to date.
pub async fn connect_and_migrate(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = connect(config).await?;
    MIGRATOR.run(&pool).await.map_err(sqlx::Error::from)?;
    info!("database schema up to date");
    Ok(pool)
}
