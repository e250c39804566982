//! # Playback Error Types
//!
//! Errors raised while resolving queued tracks into playable audio and while
//! building radio playlists.

use bridge_traits::error::BridgeError;
use core_extension::ExtensionError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// No queue entry carries the requested track id.
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// The registry has no extension with the entry's client id.
    #[error("No extension available for client: {0}")]
    NoClientAvailable(String),

    /// The extension exists but lacks a capability the operation needs.
    #[error("{extension} does not support {capability}")]
    CapabilityUnsupported {
        extension: String,
        capability: &'static str,
    },

    /// The loaded track has no stream descriptors.
    #[error("No streams found for track: {0}")]
    NoStreamsFound(String),

    // ========================================================================
    // Radio Errors
    // ========================================================================
    /// The radio built for a seed had no tracks to enqueue.
    #[error("Radio has no tracks: {0}")]
    EmptyRadio(String),

    // ========================================================================
    // Extension Errors
    // ========================================================================
    /// A capability call on an extension failed.
    #[error("Extension call failed: {0}")]
    Extension(#[from] ExtensionError),

    // ========================================================================
    // Cache / Platform Errors
    // ========================================================================
    /// The track cache could not encode or decode an entry.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A host bridge (settings, cache store, player) failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    pub fn capability_unsupported(extension: impl Into<String>, capability: &'static str) -> Self {
        PlaybackError::CapabilityUnsupported {
            extension: extension.into(),
            capability,
        }
    }

    /// Returns `true` if retrying the operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::Extension(err) => err.is_transient(),
            PlaybackError::NoClientAvailable(_) => true,
            _ => false,
        }
    }

    /// Returns `true` for the failures a single track resolution can report.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::TrackNotFound(_)
                | PlaybackError::NoClientAvailable(_)
                | PlaybackError::CapabilityUnsupported { .. }
                | PlaybackError::NoStreamsFound(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
