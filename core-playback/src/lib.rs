//! # Playback Core
//!
//! Queue, track resolution and radio building for the Echo player.
//!
//! ## Overview
//!
//! This crate handles:
//! - The playback queue and its structural change stream ([`queue`])
//! - Turning a queued track into playable audio ([`resolver`])
//! - Caching fully loaded tracks ([`cache`])
//! - Picking a stream variant by quality preference ([`quality`])
//! - Building radio playlists around a seed ([`radio`])
//!
//! ```text
//!  player ──DataRequest──> TrackResolver ──> Queue (entry lookup)
//!                              │
//!                              ├──> ExtensionRegistry (owning extension)
//!                              ├──> TrackCache (shortcut, then store)
//!                              └──> TrackClient (load, get audio)
//! ```

pub mod cache;
pub mod error;
pub mod quality;
pub mod queue;
pub mod radio;
pub mod resolver;

pub use cache::{CacheStats, TrackCache};
pub use error::{PlaybackError, Result};
pub use quality::{select_stream, StreamQuality};
pub use queue::{Queue, QueueChange, QueueEntry};
pub use radio::RadioExpansion;
pub use resolver::{DataRequest, TrackResolver};
