//! Media models shared by every extension
//!
//! A [`Track`] is used both for the light reference returned by listings
//! (search results, queue seeding) and for the fully loaded form returned by
//! [`TrackClient::load_track`](crate::clients::TrackClient::load_track). The
//! loaded form carries duration, like state, expiry and stream descriptors.

use core_runtime::logging::{redact_headers, redact_url, strip_path};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Extension metadata
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMetadata {
    /// Stable client identifier (e.g., `"echo_offline"`)
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub icon_url: Option<String>,
}

impl ExtensionMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: "1.0.0".to_string(),
            author: String::new(),
            icon_url: None,
        }
    }
}

// =============================================================================
// Streams
// =============================================================================

/// One quality/format variant of a track's audio.
///
/// Opaque to the core apart from `quality`, which is only compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streamable {
    pub id: String,
    pub quality: i32,
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

impl Streamable {
    pub fn new(id: impl Into<String>, quality: i32) -> Self {
        Self {
            id: id.into(),
            quality,
            extras: HashMap::new(),
        }
    }
}

/// Playable handle produced by resolving a [`Streamable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamableAudio {
    /// Audio stored on the device.
    LocalFile { path: String },
    /// Audio fetched over the network; `headers` go with every request.
    RemoteStream {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

impl StreamableAudio {
    /// Classify a URI: `http(s)://` becomes a remote stream, everything else
    /// (plain paths, `file://`, `content://`) a local file.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if uri.starts_with("http://") || uri.starts_with("https://") {
            StreamableAudio::RemoteStream {
                url: uri,
                headers: HashMap::new(),
            }
        } else {
            StreamableAudio::LocalFile { path: uri }
        }
    }

    /// The location the player should open.
    pub fn location(&self) -> &str {
        match self {
            StreamableAudio::LocalFile { path } => path,
            StreamableAudio::RemoteStream { url, .. } => url,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, StreamableAudio::RemoteStream { .. })
    }

    /// Loggable description: file name for local audio, URL without query
    /// plus masked headers for remote streams.
    pub fn redacted(&self) -> String {
        match self {
            StreamableAudio::LocalFile { path } => strip_path(path).to_string(),
            StreamableAudio::RemoteStream { url, headers } => {
                format!("{} {}", redact_url(url), redact_headers(headers))
            }
        }
    }
}

// =============================================================================
// Media entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub cover: Option<String>,
    pub description: Option<String>,
}

impl Artist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cover: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    pub cover: Option<String>,
    pub duration_ms: Option<u64>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub audio_streamables: Vec<Streamable>,
    /// Unix milliseconds after which a cached copy must be reloaded.
    /// `None` never expires.
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artists: Vec::new(),
            album: None,
            cover: None,
            duration_ms: None,
            release_date: None,
            liked: false,
            audio_streamables: Vec::new(),
            expires_at: None,
            extras: HashMap::new(),
        }
    }

    pub fn with_artist(mut self, artist: Artist) -> Self {
        self.artists.push(artist);
        self
    }

    pub fn with_album(mut self, album: Album) -> Self {
        self.album = Some(album);
        self
    }

    pub fn with_streamable(mut self, streamable: Streamable) -> Self {
        self.audio_streamables.push(streamable);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_liked(mut self, liked: bool) -> Self {
        self.liked = liked;
        self
    }

    /// Expired iff `now_ms` is strictly past `expires_at`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at, Some(expires_at) if now_ms > expires_at)
    }

    pub fn first_artist_name(&self) -> Option<&str> {
        self.artists.first().map(|artist| artist.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub cover: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    pub release_date: Option<String>,
    pub subtitle: Option<String>,
}

impl Album {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cover: None,
            artists: Vec::new(),
            tracks: Vec::new(),
            release_date: None,
            subtitle: None,
        }
    }

    pub fn with_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = tracks;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    pub cover: Option<String>,
    pub is_editable: bool,
    #[serde(default)]
    pub authors: Vec<User>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    pub creation_date: Option<String>,
    pub subtitle: Option<String>,
}

impl Playlist {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cover: None,
            is_editable: false,
            authors: Vec::new(),
            tracks: Vec::new(),
            creation_date: None,
            subtitle: None,
        }
    }

    pub fn with_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = tracks;
        self
    }
}

/// A tab or filter offered by feeds and search (e.g., "Albums").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
}

impl Genre {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Genre whose id and display name are the same string.
    pub fn named(name: &str) -> Self {
        Self::new(name, name)
    }
}

// =============================================================================
// Feed containers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "item")]
pub enum MediaItem {
    Track(Track),
    Album(Album),
    Artist(Artist),
    Playlist(Playlist),
}

impl MediaItem {
    pub fn id(&self) -> &str {
        match self {
            MediaItem::Track(track) => &track.id,
            MediaItem::Album(album) => &album.id,
            MediaItem::Artist(artist) => &artist.id,
            MediaItem::Playlist(playlist) => &playlist.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaItem::Track(track) => &track.title,
            MediaItem::Album(album) => &album.title,
            MediaItem::Artist(artist) => &artist.name,
            MediaItem::Playlist(playlist) => &playlist.title,
        }
    }
}

impl From<Track> for MediaItem {
    fn from(track: Track) -> Self {
        MediaItem::Track(track)
    }
}

impl From<Album> for MediaItem {
    fn from(album: Album) -> Self {
        MediaItem::Album(album)
    }
}

impl From<Artist> for MediaItem {
    fn from(artist: Artist) -> Self {
        MediaItem::Artist(artist)
    }
}

impl From<Playlist> for MediaItem {
    fn from(playlist: Playlist) -> Self {
        MediaItem::Playlist(playlist)
    }
}

/// One row of a feed: either a titled shelf of items or a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MediaItemsContainer {
    Category {
        title: String,
        items: Vec<MediaItem>,
        subtitle: Option<String>,
    },
    Item { item: MediaItem },
}

impl MediaItemsContainer {
    pub fn category(title: impl Into<String>, items: Vec<MediaItem>) -> Self {
        MediaItemsContainer::Category {
            title: title.into(),
            items,
            subtitle: None,
        }
    }

    pub fn item(item: impl Into<MediaItem>) -> Self {
        MediaItemsContainer::Item { item: item.into() }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaItemsContainer::Category { title, .. } => title,
            MediaItemsContainer::Item { item } => item.title(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuickSearchItem {
    Query { query: String, searched: bool },
    Media { item: MediaItem },
}

// =============================================================================
// Radio seeds
// =============================================================================

/// Entity a radio playlist is built around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "seed")]
pub enum RadioSeed {
    Track(Track),
    Album(Album),
    Artist(Artist),
    Playlist(Playlist),
}

impl RadioSeed {
    /// Display name of the seed (track/album/playlist title or artist name).
    pub fn title(&self) -> &str {
        match self {
            RadioSeed::Track(track) => &track.title,
            RadioSeed::Album(album) => &album.title,
            RadioSeed::Artist(artist) => &artist.name,
            RadioSeed::Playlist(playlist) => &playlist.title,
        }
    }
}
