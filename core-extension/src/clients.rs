//! Capability interfaces an extension may implement
//!
//! An extension exposes each capability it supports through the matching
//! `as_*_client` accessor on [`Extension`](crate::Extension). Callers query the
//! capability they need and treat `None` as "unsupported".

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Album, Artist, Genre, MediaItemsContainer, Playlist, QuickSearchItem, RadioSeed, Streamable,
    StreamableAudio, Track,
};
use crate::paging::PagedData;

/// Full track loading and stream resolution.
#[async_trait]
pub trait TrackClient: Send + Sync {
    /// Turn a light track reference into a fully loaded track.
    async fn load_track(&self, track: &Track) -> Result<Track>;

    /// Resolve one stream descriptor into playable audio.
    async fn get_streamable_audio(&self, streamable: &Streamable) -> Result<StreamableAudio>;

    /// Related content shown next to a track.
    fn track_media_items(&self, _track: &Track) -> PagedData<MediaItemsContainer> {
        PagedData::empty()
    }
}

#[async_trait]
pub trait AlbumClient: Send + Sync {
    async fn load_album(&self, album: &Album) -> Result<Album>;

    fn album_media_items(&self, _album: &Album) -> PagedData<MediaItemsContainer> {
        PagedData::empty()
    }
}

#[async_trait]
pub trait ArtistClient: Send + Sync {
    async fn load_artist(&self, artist: &Artist) -> Result<Artist>;

    /// Every track the extension attributes to `artist`.
    async fn artist_tracks(&self, artist: &Artist) -> Result<Vec<Track>>;

    fn artist_media_items(&self, _artist: &Artist) -> PagedData<MediaItemsContainer> {
        PagedData::empty()
    }
}

#[async_trait]
pub trait PlaylistClient: Send + Sync {
    async fn load_playlist(&self, playlist: &Playlist) -> Result<Playlist>;

    fn playlist_media_items(&self, _playlist: &Playlist) -> PagedData<MediaItemsContainer> {
        PagedData::empty()
    }
}

/// The user's library: likes, playlists and the full track listing.
#[async_trait]
pub trait LibraryClient: Send + Sync {
    async fn library_genres(&self) -> Result<Vec<Genre>>;

    fn library_feed(&self, genre: Option<&Genre>) -> PagedData<MediaItemsContainer>;

    /// Every track in the library. Radio expansion samples from this.
    async fn library_tracks(&self) -> Result<Vec<Track>>;

    /// Set the like state of `track`; returns the state the extension now
    /// reports.
    async fn like_track(&self, track: &Track, liked: bool) -> Result<bool>;

    async fn create_playlist(&self, title: &str, description: Option<&str>) -> Result<Playlist>;

    async fn delete_playlist(&self, playlist: &Playlist) -> Result<()>;

    async fn add_tracks_to_playlist(&self, playlist: &Playlist, tracks: &[Track]) -> Result<()>;

    /// Remove the tracks at `indexes` (positions in `playlist.tracks`).
    async fn remove_tracks_from_playlist(
        &self,
        playlist: &Playlist,
        indexes: &[usize],
    ) -> Result<()>;

    async fn move_track_in_playlist(
        &self,
        playlist: &Playlist,
        from: usize,
        to: usize,
    ) -> Result<()>;
}

#[async_trait]
pub trait RadioClient: Send + Sync {
    async fn radio(&self, seed: &RadioSeed) -> Result<Playlist>;
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn quick_search(&self, query: Option<&str>) -> Result<Vec<QuickSearchItem>>;

    async fn search_genres(&self, query: Option<&str>) -> Result<Vec<Genre>>;

    fn search(&self, query: Option<&str>, genre: Option<&Genre>) -> PagedData<MediaItemsContainer>;
}

#[async_trait]
pub trait HomeFeedClient: Send + Sync {
    async fn home_genres(&self) -> Result<Vec<Genre>>;

    fn home_feed(&self, genre: Option<&Genre>) -> PagedData<MediaItemsContainer>;
}

/// Play reporting (scrobbling, history).
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// `client_id` is the extension that owns `track`.
    async fn on_started_playing(&self, client_id: &str, track: &Track) -> Result<()>;

    async fn on_marked_as_played(&self, client_id: &str, track: &Track) -> Result<()>;
}
