//! Cache hit/miss counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the track cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered by the recent-track shortcut.
    pub recent_hits: u64,
    /// Lookups answered by the persistent store.
    pub store_hits: u64,
    /// Lookups that found nothing usable (absent, unreadable or expired).
    pub misses: u64,
    /// Misses caused by an expired entry.
    pub expired: u64,
    /// Tracks written to the persistent store.
    pub writes: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.recent_hits + self.store_hits
    }

    /// Fraction of lookups that hit, in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits() as f64 / total as f64
    }
}

#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    pub recent_hits: AtomicU64,
    pub store_hits: AtomicU64,
    pub misses: AtomicU64,
    pub expired: AtomicU64,
    pub writes: AtomicU64,
}

impl CacheCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            recent_hits: self.recent_hits.load(Ordering::Relaxed),
            store_hits: self.store_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}
