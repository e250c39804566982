//! Track cache storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::TrackCacheStore,
};
use bytes::Bytes;
use sqlx::{sqlite::SqlitePool, Row};
use std::path::PathBuf;
use tracing::debug;

use crate::db;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS track_cache (
        key TEXT PRIMARY KEY,
        value BLOB NOT NULL,
        stored_at INTEGER NOT NULL
    )
"#;

/// SQLite-backed persistent store for serialized tracks.
///
/// Values are opaque blobs; the store keeps whatever was written last for a
/// key and never expires anything on its own.
pub struct SqliteTrackCacheStore {
    pool: SqlitePool,
}

impl SqliteTrackCacheStore {
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        let pool = db::open_file_pool(&db_path).await?;
        db::execute_schema(&pool, SCHEMA).await?;

        debug!(path = ?db_path, "Initialized track cache store");

        Ok(Self { pool })
    }

    /// Create an in-memory store (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = db::open_memory_pool().await?;
        db::execute_schema(&pool, SCHEMA).await?;
        Ok(Self { pool })
    }

    /// Number of cached entries.
    pub async fn len(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) FROM track_cache")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| BridgeError::StorageError(format!("Failed to count entries: {}", e)))?;

        let count: i64 = row.get(0);
        Ok(count.max(0) as usize)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl TrackCacheStore for SqliteTrackCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let row = sqlx::query("SELECT value FROM track_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::StorageError(format!("Failed to read entry: {}", e)))?;

        Ok(row.map(|row| {
            let value: Vec<u8> = row.get(0);
            Bytes::from(value)
        }))
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO track_cache (key, value, stored_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(key)
        .bind(value.as_ref())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::StorageError(format!("Failed to write entry: {}", e)))?;

        debug!(key = key, size = value.len(), "Stored cache entry");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM track_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::StorageError(format!("Failed to delete entry: {}", e)))?;

        debug!(key = key, "Removed cache entry");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM track_cache")
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::StorageError(format!("Failed to clear cache: {}", e)))?;

        debug!("Cleared track cache");
        Ok(())
    }
}
