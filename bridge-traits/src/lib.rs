//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the Echo playback core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (desktop, Android, tests).
//!
//! ## Traits
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!   (the stream quality preference lives here)
//! - [`TrackCacheStore`](storage::TrackCacheStore) - Persistent key → serialized
//!   track storage backing the track cache. It does not enforce expiry; callers
//!   check the track's own expiry field.
//!
//! ### Playback
//! - [`PlayerAdapter`](playback::PlayerAdapter) - The external media-session
//!   player whose playlist mirrors the playback queue
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Settings + track cache (SQLite) |
//! | Android  | host application    | 📋 Injected at startup |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., keys, media ids)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent usage
//! across async tasks. Implementations must ensure thread safety.
//!
//! ## Examples
//!
//! ### Implementing TrackCacheStore
//!
//! ```ignore
//! use bridge_traits::storage::TrackCacheStore;
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//! use bytes::Bytes;
//!
//! pub struct MyCacheStore { /* ... */ }
//!
//! #[async_trait]
//! impl TrackCacheStore for MyCacheStore {
//!     async fn get(&self, key: &str) -> Result<Option<Bytes>> {
//!         todo!()
//!     }
//!
//!     async fn put(&self, key: &str, value: Bytes) -> Result<()> {
//!         todo!()
//!     }
//!
//!     async fn remove(&self, key: &str) -> Result<()> {
//!         todo!()
//!     }
//!
//!     async fn clear(&self) -> Result<()> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use playback::{PlaybackState, PlayerAdapter, PlayerMediaItem, RepeatMode};
pub use storage::{SettingsStore, TrackCacheStore};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
