//! Shared SQLite connection helpers

use bridge_traits::error::{BridgeError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

const DATABASE_FILE: &str = "echo.db";

/// Location of the desktop database inside the user's cache directory.
///
/// Falls back to the working directory when the platform reports no cache
/// directory.
pub fn default_database_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("echo"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATABASE_FILE)
}

/// Open (creating if needed) a database file.
pub(crate) async fn open_file_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options)
        .await
        .map_err(|e| BridgeError::StorageError(format!("Failed to connect to DB: {}", e)))?;

    debug!(path = ?db_path, "Opened database");
    Ok(pool)
}

/// Open a private in-memory database.
///
/// Every SQLite connection to `:memory:` sees its own database, so the pool
/// is pinned to a single connection.
pub(crate) async fn open_memory_pool() -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| BridgeError::StorageError(format!("Failed to connect to DB: {}", e)))
}

pub(crate) async fn execute_schema(pool: &SqlitePool, schema: &str) -> Result<()> {
    sqlx::query(schema)
        .execute(pool)
        .await
        .map_err(|e| BridgeError::StorageError(format!("Failed to create table: {}", e)))?;
    Ok(())
}
