//! Player Abstractions
//!
//! The host owns the actual media engine (decoding, output, media session).
//! The core drives it through [`PlayerAdapter`], mirroring every structural
//! queue change and transport command one-to-one so the host playlist always
//! matches the core's queue.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// High-level state of the host player, as reported back to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Buffering,
    Ready,
    Ended,
    Error { message: String },
}

/// Repeat behaviour of the host playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

/// A playlist item handed to the host player.
///
/// `media_id` is the track identifier the player will later pass back to the
/// core's resolver when it needs a stream for the item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMediaItem {
    pub media_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork_uri: Option<String>,
    pub duration_ms: Option<u64>,
    /// Arbitrary extra fields (e.g., owning extension id, queue entry key).
    pub extra: HashMap<String, String>,
}

impl PlayerMediaItem {
    pub fn new(media_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Host media player driven by the core.
///
/// Every method maps to exactly one host player call. Implementations must
/// not reorder or coalesce calls: the core relies on the host playlist
/// staying index-aligned with its queue.
#[async_trait]
pub trait PlayerAdapter: Send + Sync {
    /// Insert `items` so the first one lands at `index`.
    async fn add_media_items(&self, index: usize, items: Vec<PlayerMediaItem>) -> Result<()>;

    /// Move the item at `from` so it ends up at `to`.
    async fn move_media_item(&self, from: usize, to: usize) -> Result<()>;

    /// Remove the item at `index`.
    async fn remove_media_item(&self, index: usize) -> Result<()>;

    /// Remove every item.
    async fn clear_media_items(&self) -> Result<()>;

    /// Number of items currently in the host playlist.
    async fn media_item_count(&self) -> Result<usize>;

    /// Prepare the player after the playlist changed.
    async fn prepare(&self) -> Result<()>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Whether playback should start as soon as the player is ready.
    async fn set_play_when_ready(&self, play_when_ready: bool) -> Result<()>;

    /// Seek inside the current item.
    async fn seek_to(&self, position: Duration) -> Result<()>;

    /// Jump to the start of the item at `index`.
    async fn seek_to_default_position(&self, index: usize) -> Result<()>;

    async fn seek_to_next(&self) -> Result<()>;

    async fn seek_to_previous(&self) -> Result<()>;

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()>;

    async fn set_shuffle_mode(&self, enabled: bool) -> Result<()>;
}
