//! Database connection handling.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use crate::error::{StoreError, StoreResult};

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection URL
    pub url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Pool acquire/connect timeout
    pub connect_timeout: Duration,
    /// Server-side cap on any single statement
    pub statement_timeout: Duration,
}

impl DatabaseConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| StoreError::config_error("DATABASE_URL is not set"))?;

        Ok(Self {
            url,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            connect_timeout: Duration::from_secs(
                std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            statement_timeout: Duration::from_secs(
                std::env::var("DATABASE_STATEMENT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }

    /// Connect options carrying the statement timeout, so a hung connection
    /// cannot stall a query past the configured bound.
    pub fn connect_options(&self) -> StoreResult<PgConnectOptions> {
        let options = PgConnectOptions::from_str(&self.url)?.options([(
            "statement_timeout",
            self.statement_timeout.as_millis().to_string(),
        )]);
        Ok(options)
    }
}

/// Postgres-backed database handle.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect and run pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(config.connect_options()?)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database connected, migrations applied");

        Ok(Self { pool })
    }

    /// Connect using environment configuration.
    pub async fn from_env() -> StoreResult<Self> {
        Self::connect(&DatabaseConfig::from_env()?).await
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Lightweight connectivity check for readiness probes.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: 5,
            connect_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_connect_options_accepts_postgres_url() {
        let options = config("postgres://user:pw@localhost:5432/applications").connect_options();
        assert!(options.is_ok());
    }

    #[test]
    fn test_connect_options_rejects_garbage_url() {
        assert!(config("not a database url").connect_options().is_err());
    }
}
