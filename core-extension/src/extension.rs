//! The extension object and its capability queries

use async_trait::async_trait;

use crate::clients::{
    AlbumClient, ArtistClient, HomeFeedClient, LibraryClient, PlaylistClient, RadioClient,
    SearchClient, TrackClient, TrackerClient,
};
use crate::error::Result;
use crate::models::ExtensionMetadata;

/// A pluggable media backend.
///
/// Implementors return `Some(self)` from the accessor of every capability
/// they implement:
///
/// ```ignore
/// impl Extension for MyExtension {
///     fn metadata(&self) -> &ExtensionMetadata { &self.metadata }
///
///     fn as_track_client(&self) -> Option<&dyn TrackClient> { Some(self) }
/// }
/// ```
#[async_trait]
pub trait Extension: Send + Sync {
    fn metadata(&self) -> &ExtensionMetadata;

    fn id(&self) -> &str {
        &self.metadata().id
    }

    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Runs when the extension becomes the selected one.
    async fn on_extension_selected(&self) -> Result<()> {
        Ok(())
    }

    fn as_track_client(&self) -> Option<&dyn TrackClient> {
        None
    }

    fn as_album_client(&self) -> Option<&dyn AlbumClient> {
        None
    }

    fn as_artist_client(&self) -> Option<&dyn ArtistClient> {
        None
    }

    fn as_playlist_client(&self) -> Option<&dyn PlaylistClient> {
        None
    }

    fn as_library_client(&self) -> Option<&dyn LibraryClient> {
        None
    }

    fn as_radio_client(&self) -> Option<&dyn RadioClient> {
        None
    }

    fn as_search_client(&self) -> Option<&dyn SearchClient> {
        None
    }

    fn as_home_feed_client(&self) -> Option<&dyn HomeFeedClient> {
        None
    }

    fn as_tracker_client(&self) -> Option<&dyn TrackerClient> {
        None
    }

    /// Names of the capabilities this extension exposes, for logs and UI.
    fn capabilities(&self) -> Vec<&'static str> {
        let mut caps = Vec::new();
        if self.as_track_client().is_some() {
            caps.push("track");
        }
        if self.as_album_client().is_some() {
            caps.push("album");
        }
        if self.as_artist_client().is_some() {
            caps.push("artist");
        }
        if self.as_playlist_client().is_some() {
            caps.push("playlist");
        }
        if self.as_library_client().is_some() {
            caps.push("library");
        }
        if self.as_radio_client().is_some() {
            caps.push("radio");
        }
        if self.as_search_client().is_some() {
            caps.push("search");
        }
        if self.as_home_feed_client().is_some() {
            caps.push("home_feed");
        }
        if self.as_tracker_client().is_some() {
            caps.push("tracker");
        }
        caps
    }
}
