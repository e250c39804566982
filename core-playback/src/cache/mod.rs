//! # Track Cache
//!
//! Avoids redundant full-track loads.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │            TrackCache                  │
//! │  - get() / put() / remember()          │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> recent-track shortcut (in-memory LRU, keyed by id)
//!          ├──> TrackCacheStore (persistent, host provided)
//!          └──> Clock (expiry checks)
//! ```
//!
//! Expiry is enforced here, not by the store: a track whose `expires_at` is
//! in the past is reported as a miss from either layer.

pub mod stats;
pub mod track_cache;

pub use stats::CacheStats;
pub use track_cache::TrackCache;
