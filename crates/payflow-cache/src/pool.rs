//! SQLite storage for client state
//!
//! One small database file per client holding the `kv_store` table.
//! Opening it creates the parent directory and applies the schema.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

const SCHEMA: &str = include_str!("migrations/20260301_initial.sql");

/// Connections for a single CLI or watch session
const FILE_CONNECTIONS: u32 = 2;

/// In-memory databases are private to one connection
const MEMORY_CONNECTIONS: u32 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite pool backing [`crate::SqliteKeyValueStore`]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (or creates) the state database at `db_path` in WAL mode
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Cannot create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let label = db_path.display().to_string();
        let pool = Self::connect(options, FILE_CONNECTIONS, &label).await?;

        tracing::info!(path = %db_path.display(), "Opened client state database");
        Ok(Self { pool })
    }

    /// Opens a throwaway database for tests
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::ConnectionFailed(format!("in-memory database: {}", e)))?;
        let pool = Self::connect(options, MEMORY_CONNECTIONS, "in-memory database").await?;

        tracing::debug!("Opened in-memory state database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for in-flight queries and closes every connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn connect(
        options: SqliteConnectOptions,
        max_connections: u32,
        label: &str,
    ) -> Result<SqlitePool, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            // an in-memory database lives only as long as its connection
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("{}: {}", label, e)))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| CacheError::MigrationFailed(format!("{}: {}", label, e)))?;

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_applied() {
        let db = DatabasePool::in_memory().await.unwrap();
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE name = 'kv_store'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("payflow.db");

        let db = DatabasePool::new(&path).await.unwrap();
        db.close().await;

        assert!(path.exists());
    }
}
