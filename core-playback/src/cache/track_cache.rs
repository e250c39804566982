//! Track cache over a host-provided persistent store.

use bridge_traits::storage::TrackCacheStore;
use bridge_traits::time::Clock;
use bytes::Bytes;
use core_extension::Track;
use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::stats::{CacheCounters, CacheStats};
use crate::error::{PlaybackError, Result};

pub struct TrackCache {
    store: Arc<dyn TrackCacheStore>,
    clock: Arc<dyn Clock>,
    recent: Mutex<LruCache<String, Arc<Track>>>,
    counters: CacheCounters,
}

impl TrackCache {
    /// `recent_capacity` is the number of recently resolved tracks kept in
    /// memory; `1` remembers only the last one. Zero is treated as one.
    pub fn new(
        store: Arc<dyn TrackCacheStore>,
        clock: Arc<dyn Clock>,
        recent_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(recent_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            clock,
            recent: Mutex::new(LruCache::new(capacity)),
            counters: CacheCounters::default(),
        }
    }

    fn is_expired(&self, track: &Track) -> bool {
        track.is_expired(self.clock.unix_timestamp_millis())
    }

    /// A usable cached copy of track `id`, if any.
    ///
    /// The recent-track shortcut is consulted first, then the persistent
    /// store. Expired, unreadable and absent entries are all misses; store
    /// failures are logged rather than returned.
    pub async fn get(&self, id: &str) -> Option<Arc<Track>> {
        if let Some(track) = self.recent(id) {
            CacheCounters::bump(&self.counters.recent_hits);
            return Some(track);
        }

        let bytes = match self.store.get(id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                trace!(track_id = id, "Track cache miss");
                CacheCounters::bump(&self.counters.misses);
                return None;
            }
            Err(error) => {
                warn!(track_id = id, error = %error, "Track cache lookup failed");
                CacheCounters::bump(&self.counters.misses);
                return None;
            }
        };

        let track: Track = match serde_json::from_slice(&bytes) {
            Ok(track) => track,
            Err(error) => {
                warn!(track_id = id, error = %error, "Discarding unreadable cached track");
                CacheCounters::bump(&self.counters.misses);
                return None;
            }
        };

        if self.is_expired(&track) {
            debug!(track_id = id, expires_at = ?track.expires_at, "Cached track expired");
            CacheCounters::bump(&self.counters.expired);
            CacheCounters::bump(&self.counters.misses);
            return None;
        }

        CacheCounters::bump(&self.counters.store_hits);
        Some(Arc::new(track))
    }

    /// Persist `track` under `id`, replacing any previous entry.
    pub async fn put(&self, id: &str, track: &Track) -> Result<()> {
        let encoded = serde_json::to_vec(track)
            .map_err(|e| PlaybackError::Cache(format!("Failed to encode track {id}: {e}")))?;
        self.store.put(id, Bytes::from(encoded)).await?;
        CacheCounters::bump(&self.counters.writes);
        trace!(track_id = id, "Track cached");
        Ok(())
    }

    /// Remember `track` in the recent-track shortcut.
    pub fn remember(&self, track: Arc<Track>) {
        self.recent.lock().put(track.id.clone(), track);
    }

    /// The shortcut entry for `id`, if present and not expired. An expired
    /// entry is dropped.
    pub fn recent(&self, id: &str) -> Option<Arc<Track>> {
        let mut recent = self.recent.lock();
        let track = recent.get(id).cloned()?;
        if self.is_expired(&track) {
            recent.pop(id);
            CacheCounters::bump(&self.counters.expired);
            return None;
        }
        Some(track)
    }

    /// Drop every copy of track `id`.
    pub async fn invalidate(&self, id: &str) -> Result<()> {
        self.recent.lock().pop(id);
        self.store.remove(id).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.recent.lock().clear();
        self.store.clear().await?;
        debug!("Track cache cleared");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

impl fmt::Debug for TrackCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recent = self.recent.lock();
        f.debug_struct("TrackCache")
            .field("recent_len", &recent.len())
            .field("recent_capacity", &recent.cap())
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::time::ManualClock;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Store {}

        #[async_trait::async_trait]
        impl TrackCacheStore for Store {
            async fn get(&self, key: &str) -> BridgeResult<Option<Bytes>>;
            async fn put(&self, key: &str, value: Bytes) -> BridgeResult<()>;
            async fn remove(&self, key: &str) -> BridgeResult<()>;
            async fn clear(&self) -> BridgeResult<()>;
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        data: Mutex<HashMap<String, Bytes>>,
    }

    #[async_trait::async_trait]
    impl TrackCacheStore for MemoryStore {
        async fn get(&self, key: &str) -> BridgeResult<Option<Bytes>> {
            Ok(self.data.lock().get(key).cloned())
        }

        async fn put(&self, key: &str, value: Bytes) -> BridgeResult<()> {
            self.data.lock().insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().remove(key);
            Ok(())
        }

        async fn clear(&self) -> BridgeResult<()> {
            self.data.lock().clear();
            Ok(())
        }
    }

    fn cache_with(store: Arc<dyn TrackCacheStore>, clock: Arc<ManualClock>, recent: usize) -> TrackCache {
        TrackCache::new(store, clock, recent)
    }

    #[tokio::test]
    async fn test_put_then_get_from_store() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_with(Arc::new(MemoryStore::default()), clock, 1);

        cache.put("t1", &Track::new("t1", "Song")).await.unwrap();
        let track = cache.get("t1").await.unwrap();
        assert_eq!(track.title, "Song");
        assert!(cache.get("t2").await.is_none());

        let stats = cache.stats();
        assert_eq!(stats.store_hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_with(Arc::new(MemoryStore::default()), clock, 1);

        cache.put("t1", &Track::new("t1", "Old")).await.unwrap();
        cache.put("t1", &Track::new("t1", "New")).await.unwrap();
        assert_eq!(cache.get("t1").await.unwrap().title, "New");
    }

    #[tokio::test]
    async fn test_expired_store_entry_is_a_miss() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = cache_with(Arc::new(MemoryStore::default()), clock.clone(), 1);

        cache
            .put("t1", &Track::new("t1", "Song").with_expires_at(2_000))
            .await
            .unwrap();
        assert!(cache.get("t1").await.is_some());

        clock.set_millis(2_000);
        assert!(cache.get("t1").await.is_some());

        clock.set_millis(2_001);
        assert!(cache.get("t1").await.is_none());
        assert_eq!(cache.stats().expired, 1);
    }

    #[tokio::test]
    async fn test_recent_shortcut_skips_store() {
        let mut store = MockStore::new();
        store.expect_get().times(0);
        let cache = cache_with(Arc::new(store), Arc::new(ManualClock::new(0)), 1);

        let track = Arc::new(Track::new("t1", "Song"));
        cache.remember(track.clone());

        let hit = cache.get("t1").await.unwrap();
        assert!(Arc::ptr_eq(&hit, &track));
        assert_eq!(cache.stats().recent_hits, 1);
    }

    #[tokio::test]
    async fn test_single_slot_keeps_only_last_track() {
        let cache = cache_with(
            Arc::new(MemoryStore::default()),
            Arc::new(ManualClock::new(0)),
            1,
        );
        cache.remember(Arc::new(Track::new("t1", "One")));
        cache.remember(Arc::new(Track::new("t2", "Two")));

        assert!(cache.recent("t1").is_none());
        assert!(cache.recent("t2").is_some());
    }

    #[tokio::test]
    async fn test_keyed_shortcut_holds_several_tracks() {
        let cache = cache_with(
            Arc::new(MemoryStore::default()),
            Arc::new(ManualClock::new(0)),
            4,
        );
        cache.remember(Arc::new(Track::new("t1", "One")));
        cache.remember(Arc::new(Track::new("t2", "Two")));

        assert!(cache.recent("t1").is_some());
        assert!(cache.recent("t2").is_some());
    }

    #[tokio::test]
    async fn test_expired_recent_entry_is_dropped() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_with(Arc::new(MemoryStore::default()), clock.clone(), 1);
        cache.remember(Arc::new(Track::new("t1", "Song").with_expires_at(10)));

        clock.set_millis(11);
        assert!(cache.get("t1").await.is_none());
        clock.set_millis(0);
        assert!(cache.recent("t1").is_none());
    }

    #[tokio::test]
    async fn test_store_failures_are_misses() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Err(BridgeError::StorageError("disk".to_string())));
        store
            .expect_put()
            .returning(|_, _| Err(BridgeError::StorageError("disk".to_string())));
        let cache = cache_with(Arc::new(store), Arc::new(ManualClock::new(0)), 1);

        assert!(cache.get("t1").await.is_none());
        let err = cache.put("t1", &Track::new("t1", "Song")).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Bridge(_)));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_a_miss() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(Bytes::from_static(b"not json"))));
        let cache = cache_with(Arc::new(store), Arc::new(ManualClock::new(0)), 1);

        assert!(cache.get("t1").await.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = cache_with(
            Arc::new(MemoryStore::default()),
            Arc::new(ManualClock::new(0)),
            1,
        );
        let track = Track::new("t1", "Song");
        cache.put("t1", &track).await.unwrap();
        cache.remember(Arc::new(track));

        cache.invalidate("t1").await.unwrap();
        assert!(cache.get("t1").await.is_none());

        cache.put("t2", &Track::new("t2", "Other")).await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.get("t2").await.is_none());
    }
}
