//! # Core Configuration Module
//!
//! Provides configuration management for the Echo playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all host bridges and tunables the playback core needs.
//! It enforces fail-fast validation so missing bridges are reported before any
//! component is wired.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - User preferences (the stream quality preference)
//! - `TrackCacheStore` - Persistent storage behind the track cache
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Time source for cache expiry (default: `SystemClock`)
//!
//! When the `desktop-shims` feature is enabled,
//! [`CoreConfigBuilder::build_with_desktop_defaults`] injects SQLite-backed
//! stores for whichever store was not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .settings_store(Arc::new(MySettingsStore))
//!     .track_cache_store(Arc::new(MyCacheStore))
//!     .default_stream_quality("medium")
//!     .radio_sample_size(25)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing stores produce an actionable CapabilityMissing error
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, SettingsStore, SystemClock, TrackCacheStore};
use std::path::PathBuf;
use std::sync::Arc;

use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Settings key holding the preferred stream quality.
pub const STREAM_QUALITY_KEY: &str = "stream_quality";

/// Quality used when the preference has never been set.
pub const DEFAULT_STREAM_QUALITY: &str = "lowest";

/// Number of random library tracks mixed into each radio playlist.
pub const DEFAULT_RADIO_SAMPLE_SIZE: usize = 25;

/// Capacity of the recent-track shortcut in front of the track cache.
pub const DEFAULT_RECENT_TRACK_CAPACITY: usize = 1;

const MAX_RADIO_SAMPLE_SIZE: usize = 1_000;
const MAX_RECENT_TRACK_CAPACITY: usize = 1_024;

/// Core configuration for the Echo playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Database file used by desktop default stores, if any
    pub database_path: Option<PathBuf>,

    /// User preferences storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Persistent track cache storage (required)
    pub track_cache_store: Arc<dyn TrackCacheStore>,

    /// Time source for expiry checks
    pub clock: Arc<dyn Clock>,

    /// Buffer size of the core event bus
    pub event_buffer_size: usize,

    /// Quality used when the `stream_quality` preference is unset or unreadable
    pub default_stream_quality: String,

    /// Random library tracks mixed into radio playlists
    pub radio_sample_size: usize,

    /// Entries kept in the recent-track shortcut (1 = single slot)
    pub recent_track_capacity: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("settings_store", &"SettingsStore { ... }")
            .field("track_cache_store", &"TrackCacheStore { ... }")
            .field("clock", &"Clock { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .field("default_stream_quality", &self.default_stream_quality)
            .field("radio_sample_size", &self.radio_sample_size)
            .field("recent_track_capacity", &self.recent_track_capacity)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Event buffer size is > 0
    /// - Default stream quality is not empty
    /// - Radio sample size is within 1..=1000
    /// - Recent-track capacity is within 1..=1024
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.default_stream_quality.trim().is_empty() {
            return Err(Error::Config(
                "Default stream quality cannot be empty".to_string(),
            ));
        }

        if self.radio_sample_size == 0 || self.radio_sample_size > MAX_RADIO_SAMPLE_SIZE {
            return Err(Error::Config(format!(
                "Radio sample size must be between 1 and {}",
                MAX_RADIO_SAMPLE_SIZE
            )));
        }

        if self.recent_track_capacity == 0
            || self.recent_track_capacity > MAX_RECENT_TRACK_CAPACITY
        {
            return Err(Error::Config(format!(
                "Recent track capacity must be between 1 and {}",
                MAX_RECENT_TRACK_CAPACITY
            )));
        }

        Ok(())
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for the stream quality preference. \
                 Desktop: enable the 'desktop-shims' feature and call build_with_desktop_defaults(). \
                 Android: inject a SharedPreferences/DataStore-backed store."
            .to_string(),
    }
}

fn track_cache_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "TrackCacheStore".to_string(),
        message: "TrackCacheStore implementation is required to persist loaded tracks. \
                 Desktop: enable the 'desktop-shims' feature and call build_with_desktop_defaults(). \
                 Android: inject a cache-directory-backed store."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    track_cache_store: Option<Arc<dyn TrackCacheStore>>,
    clock: Option<Arc<dyn Clock>>,
    event_buffer_size: Option<usize>,
    default_stream_quality: Option<String>,
    radio_sample_size: Option<usize>,
    recent_track_capacity: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the database file used by desktop default stores.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().database_path("/path/to/echo.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the settings store implementation (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the track cache store implementation (required).
    pub fn track_cache_store(mut self, store: Arc<dyn TrackCacheStore>) -> Self {
        self.track_cache_store = Some(store);
        self
    }

    /// Overrides the time source. Tests inject a `ManualClock` here.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Quality used when the preference is unset. Default: `"lowest"`.
    pub fn default_stream_quality(mut self, quality: impl Into<String>) -> Self {
        self.default_stream_quality = Some(quality.into());
        self
    }

    /// Default: 25
    pub fn radio_sample_size(mut self, size: usize) -> Self {
        self.radio_sample_size = Some(size);
        self
    }

    /// Default: 1
    pub fn recent_track_capacity(mut self, capacity: usize) -> Self {
        self.recent_track_capacity = Some(capacity);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if a required store is missing or a value is out of
    /// range.
    pub fn build(self) -> Result<CoreConfig> {
        let settings_store = self
            .settings_store
            .ok_or_else(settings_store_missing_error)?;

        let track_cache_store = self
            .track_cache_store
            .ok_or_else(track_cache_store_missing_error)?;

        let config = CoreConfig {
            database_path: self.database_path,
            settings_store,
            track_cache_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            default_stream_quality: self
                .default_stream_quality
                .unwrap_or_else(|| DEFAULT_STREAM_QUALITY.to_string()),
            radio_sample_size: self.radio_sample_size.unwrap_or(DEFAULT_RADIO_SAMPLE_SIZE),
            recent_track_capacity: self
                .recent_track_capacity
                .unwrap_or(DEFAULT_RECENT_TRACK_CAPACITY),
        };

        config.validate()?;

        Ok(config)
    }

    /// Builds the config, opening SQLite-backed stores for whichever store
    /// was not provided.
    ///
    /// Both default stores share `database_path`, or the desktop cache
    /// location when no path was set.
    #[cfg(feature = "desktop-shims")]
    pub async fn build_with_desktop_defaults(mut self) -> Result<CoreConfig> {
        use bridge_desktop::{default_database_path, SqliteSettingsStore, SqliteTrackCacheStore};

        let path = self
            .database_path
            .clone()
            .unwrap_or_else(default_database_path);

        if self.settings_store.is_none() {
            let store = SqliteSettingsStore::new(path.clone()).await.map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })?;
            self.settings_store = Some(Arc::new(store));
        }

        if self.track_cache_store.is_none() {
            let store = SqliteTrackCacheStore::new(path.clone()).await.map_err(|e| {
                Error::Internal(format!(
                    "Failed to initialize default TrackCacheStore: {}",
                    e
                ))
            })?;
            self.track_cache_store = Some(Arc::new(store));
        }

        self.database_path = Some(path);
        self.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::ManualClock;
    use bytes::Bytes;
    use mockall::mock;

    mock! {
        Settings {}

        #[async_trait]
        impl SettingsStore for Settings {
            async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()>;
            async fn get_string(&self, key: &str) -> BridgeResult<Option<String>>;
            async fn delete(&self, key: &str) -> BridgeResult<()>;
        }
    }

    mock! {
        CacheStore {}

        #[async_trait]
        impl TrackCacheStore for CacheStore {
            async fn get(&self, key: &str) -> BridgeResult<Option<Bytes>>;
            async fn put(&self, key: &str, value: Bytes) -> BridgeResult<()>;
            async fn remove(&self, key: &str) -> BridgeResult<()>;
            async fn clear(&self) -> BridgeResult<()>;
        }
    }

    fn builder_with_stores() -> CoreConfigBuilder {
        CoreConfig::builder()
            .settings_store(Arc::new(MockSettings::new()))
            .track_cache_store(Arc::new(MockCacheStore::new()))
    }

    #[test]
    fn test_builder_requires_settings_store() {
        let result = CoreConfig::builder()
            .track_cache_store(Arc::new(MockCacheStore::new()))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "SettingsStore")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builder_requires_track_cache_store() {
        let result = CoreConfig::builder()
            .settings_store(Arc::new(MockSettings::new()))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "TrackCacheStore")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder_with_stores().build().unwrap();

        assert_eq!(config.database_path, None);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.default_stream_quality, "lowest");
        assert_eq!(config.radio_sample_size, 25);
        assert_eq!(config.recent_track_capacity, 1);
        assert!(config.clock.unix_timestamp_millis() > 0);
    }

    #[test]
    fn test_builder_overrides() {
        let clock = Arc::new(ManualClock::new(5_000));
        let config = builder_with_stores()
            .database_path("/tmp/echo.db")
            .clock(clock)
            .event_buffer_size(16)
            .default_stream_quality("highest")
            .radio_sample_size(10)
            .recent_track_capacity(4)
            .build()
            .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/echo.db")));
        assert_eq!(config.clock.unix_timestamp_millis(), 5_000);
        assert_eq!(config.event_buffer_size, 16);
        assert_eq!(config.default_stream_quality, "highest");
        assert_eq!(config.radio_sample_size, 10);
        assert_eq!(config.recent_track_capacity, 4);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        assert!(builder_with_stores().event_buffer_size(0).build().is_err());
        assert!(builder_with_stores().radio_sample_size(0).build().is_err());
        assert!(builder_with_stores()
            .radio_sample_size(MAX_RADIO_SAMPLE_SIZE + 1)
            .build()
            .is_err());
        assert!(builder_with_stores()
            .recent_track_capacity(0)
            .build()
            .is_err());
        assert!(builder_with_stores()
            .default_stream_quality("  ")
            .build()
            .is_err());
        assert!(builder_with_stores().database_path("").build().is_err());
    }

    #[test]
    fn test_debug_hides_trait_objects() {
        let config = builder_with_stores().build().unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("SettingsStore { ... }"));
        assert!(rendered.contains("radio_sample_size: 25"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = builder_with_stores().build().unwrap();
        let cloned = config.clone();
        assert!(Arc::ptr_eq(&config.settings_store, &cloned.settings_store));
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!("echo-config-{}", uuid::Uuid::new_v4()));
        let db_path = base.join("echo.db");

        let config = CoreConfig::builder()
            .database_path(&db_path)
            .build_with_desktop_defaults()
            .await
            .expect("desktop defaults should succeed");

        config
            .settings_store
            .set_string(STREAM_QUALITY_KEY, "medium")
            .await
            .unwrap();
        let value = config
            .settings_store
            .get_string(STREAM_QUALITY_KEY)
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("medium"));

        config
            .track_cache_store
            .put("t1", Bytes::from_static(b"{}"))
            .await
            .unwrap();
        assert!(config.track_cache_store.get("t1").await.unwrap().is_some());

        drop(config);
        let _ = tokio::fs::remove_dir_all(&base).await;
    }
}
