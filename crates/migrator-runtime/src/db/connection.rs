use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, warn};

use migrator_core::config::DatabaseConfig;
use migrator_core::error::{MigratorError, Result};

use super::{ExecutionError, StatementExecutor};

/// A single, unpooled PostgreSQL connection held for the whole run.
pub struct Database {
    conn: PgConnection,
}

impl Database {
    /// Open a connection to `url`.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self> {
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| MigratorError::Config(format!("Invalid database URL: {}", e)))?
            .application_name(&config.application_name);

        let conn = options
            .connect()
            .await
            .map_err(|e| MigratorError::Database(format!("Failed to connect: {}", e)))?;

        debug!("Database connection established");
        Ok(Self { conn })
    }

    /// Take a session-level advisory lock, blocking until it is granted.
    pub async fn acquire_lock(&mut self, key: i64) -> Result<()> {
        debug!("Acquiring migration lock {}...", key);
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(key)
            .execute(&mut self.conn)
            .await
            .map_err(|e| {
                MigratorError::Database(format!("Failed to acquire migration lock: {}", e))
            })?;
        debug!("Migration lock acquired");
        Ok(())
    }

    /// Release a lock taken with [`Database::acquire_lock`].
    pub async fn release_lock(&mut self, key: i64) -> Result<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(key)
            .execute(&mut self.conn)
            .await
            .map_err(|e| {
                MigratorError::Database(format!("Failed to release migration lock: {}", e))
            })?;
        debug!("Migration lock released");
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&mut self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| MigratorError::Database(format!("Health check failed: {}", e)))
    }

    /// Close the connection gracefully.
    pub async fn close(self) {
        if let Err(e) = self.conn.close().await {
            warn!("Failed to close database connection cleanly: {}", e);
        }
    }
}

impl StatementExecutor for Database {
    async fn execute(&mut self, sql: &str) -> std::result::Result<(), ExecutionError> {
        // Simple query protocol: no prepare step, so any DDL is accepted.
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql)).await?;
        Ok(())
    }
}
