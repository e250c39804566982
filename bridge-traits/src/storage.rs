//! Storage Abstractions
//!
//! Provides platform-agnostic traits for key-value settings storage and the
//! persistent store behind the track cache.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// User preferences read by the core.
///
/// The core only stores strings (the stream quality preference); hosts
/// back it with SharedPreferences/DataStore on Android or the SQLite table
/// in `bridge-desktop`.
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn prefer_high_quality(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("stream_quality", "highest").await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// `None` when the key was never set or has been deleted.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Forget `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Persistent store for serialized tracks.
///
/// Keys are track identifiers, values are opaque serialized tracks produced
/// by the core. The store never interprets values and never expires them:
/// expiry is checked by the caller against the track's own expiry field.
///
/// - Android: app cache directory files
/// - Desktop: SQLite table (`bridge-desktop`)
#[async_trait]
pub trait TrackCacheStore: Send + Sync {
    /// Fetch the serialized value for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn put(&self, key: &str, value: Bytes) -> Result<()>;

    /// Remove the value stored under `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove every stored value.
    async fn clear(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;
    use std::sync::Arc;

    mock! {
        Settings {}

        #[async_trait]
        impl SettingsStore for Settings {
            async fn set_string(&self, key: &str, value: &str) -> Result<()>;
            async fn get_string(&self, key: &str) -> Result<Option<String>>;
            async fn delete(&self, key: &str) -> Result<()>;
        }
    }

    mock! {
        CacheStore {}

        #[async_trait]
        impl TrackCacheStore for CacheStore {
            async fn get(&self, key: &str) -> Result<Option<Bytes>>;
            async fn put(&self, key: &str, value: Bytes) -> Result<()>;
            async fn remove(&self, key: &str) -> Result<()>;
            async fn clear(&self) -> Result<()>;
        }
    }

    #[tokio::test]
    async fn test_cache_store_is_object_safe() {
        let mut store = MockCacheStore::new();
        store
            .expect_get()
            .with(eq("track-1"))
            .times(1)
            .returning(|_| Ok(Some(Bytes::from_static(b"{}"))));

        let store: Box<dyn TrackCacheStore> = Box::new(store);
        let value = store.get("track-1").await.unwrap();
        assert_eq!(value, Some(Bytes::from_static(b"{}")));
    }

    #[tokio::test]
    async fn test_settings_store_reads_string_preferences() {
        let mut store = MockSettings::new();
        store
            .expect_get_string()
            .with(eq("stream_quality"))
            .times(1)
            .returning(|_| Ok(Some("highest".to_string())));
        store.expect_delete().with(eq("stream_quality")).times(1).returning(|_| Ok(()));

        let store: Arc<dyn SettingsStore> = Arc::new(store);
        assert_eq!(
            store.get_string("stream_quality").await.unwrap().as_deref(),
            Some("highest")
        );
        store.delete("stream_quality").await.unwrap();
    }
}
