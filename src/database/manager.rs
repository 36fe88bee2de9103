use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::resource::Registry;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Storage connection handle. Owned by application state and passed
/// explicitly to whatever needs it; there is no process-global pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect using the application database configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DatabaseError::InvalidDatabaseUrl(format!("{}: {}", config.url, e)))?
            .create_if_missing(config.create_if_missing);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await?;

        info!("Connected to database: {}", config.url);
        Ok(Self { pool })
    }

    /// Connect to an explicit URL. Used by tests with `sqlite::memory:`;
    /// an in-memory database needs a single connection so every request
    /// sees the same data.
    pub async fn connect_url(url: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DatabaseError::InvalidDatabaseUrl(format!("{}: {}", url, e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create any missing tables from the registry's column definitions.
    /// Tables are auto-created on startup; there is no migration tooling.
    pub async fn ensure_schema(&self, registry: &Registry) -> Result<(), DatabaseError> {
        for resource in registry.resources() {
            let ddl = create_table_sql(resource);
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        info!("Database schema ready ({} tables)", registry.len());
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn create_table_sql(resource: &crate::resource::ResourceDef) -> String {
    let mut columns = vec!["\"id\" INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    for col in resource.attribute_columns() {
        let null_clause = if col.required { " NOT NULL" } else { "" };
        columns.push(format!("\"{}\" {}{}", col.name, col.ty.sql_type(), null_clause));
    }
    format!("CREATE TABLE IF NOT EXISTS \"{}\" ({})", resource.table, columns.join(", "))
}
