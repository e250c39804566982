//! The offline extension.
//!
//! Serves the device library through every browsing capability. The library
//! is scanned when the extension is selected and kept in memory; playlist
//! edits and likes are applied to that snapshot.
//!
//! Tracks are expected to carry one [`Streamable`] whose id is the file
//! location; resolving it yields a local-file [`StreamableAudio`].

use async_trait::async_trait;
use core_extension::{
    Album, AlbumClient, Artist, ArtistClient, Extension, ExtensionMetadata, Genre,
    HomeFeedClient, LibraryClient, MediaItem, MediaItemsContainer, PagedData, Playlist,
    PlaylistClient, QuickSearchItem, RadioClient, RadioSeed, Result, SearchClient, Streamable,
    StreamableAudio, Track, TrackClient,
};
use core_playback::RadioExpansion;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{OfflineError, Result as OfflineResult};
use crate::library::{LibraryScanner, LibrarySnapshot};
use crate::search::{search_by, Rank};

/// Client id of the offline extension.
pub const OFFLINE_EXTENSION_ID: &str = "echo_offline";

/// Items shown on a home shelf.
const SHELF_SIZE: usize = 10;

const QUICK_SEARCH_LIMIT: usize = 5;

const HOME_GENRES: [&str; 5] = ["All", "Songs", "Albums", "Artists", "Genres"];
const SEARCH_GENRES: [&str; 4] = ["All", "Tracks", "Albums", "Artists"];
const LIBRARY_GENRES: [&str; 1] = ["Playlists"];

pub struct OfflineExtension {
    metadata: ExtensionMetadata,
    scanner: Arc<dyn LibraryScanner>,
    library: RwLock<Option<LibrarySnapshot>>,
    radio: RadioExpansion,
    event_bus: Option<EventBus>,
}

impl OfflineExtension {
    pub fn new(scanner: Arc<dyn LibraryScanner>) -> Self {
        let mut metadata = ExtensionMetadata::new(OFFLINE_EXTENSION_ID, "Offline");
        metadata.description = "Offline extension".to_string();
        metadata.author = "Echo".to_string();

        Self {
            metadata,
            scanner,
            library: RwLock::new(None),
            radio: RadioExpansion::default(),
            event_bus: None,
        }
    }

    pub fn with_radio(mut self, radio: RadioExpansion) -> Self {
        self.radio = radio;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Rescan the library, replacing the snapshot. Returns the track count.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> OfflineResult<usize> {
        let snapshot = self.scanner.scan().await?;
        let count = snapshot.len();
        *self.library.write() = Some(snapshot);

        info!(tracks = count, "Offline library loaded");
        self.emit(LibraryEvent::LibraryLoaded {
            client_id: OFFLINE_EXTENSION_ID.to_string(),
            track_count: count,
        });
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        self.library.read().is_some()
    }

    fn read<R>(&self, f: impl FnOnce(&LibrarySnapshot) -> R) -> OfflineResult<R> {
        self.library
            .read()
            .as_ref()
            .map(f)
            .ok_or(OfflineError::LibraryNotLoaded)
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut LibrarySnapshot) -> OfflineResult<R>,
    ) -> OfflineResult<R> {
        let mut library = self.library.write();
        let snapshot = library.as_mut().ok_or(OfflineError::LibraryNotLoaded)?;
        f(snapshot)
    }

    /// A single-page feed built from the snapshot, empty before loading.
    fn feed<F>(&self, build: F) -> PagedData<MediaItemsContainer>
    where
        F: FnOnce(&LibrarySnapshot) -> Vec<MediaItemsContainer>,
    {
        match self.read(build) {
            Ok(containers) => PagedData::single(containers),
            Err(error) => {
                debug!(error = %error, "Serving empty feed");
                PagedData::empty()
            }
        }
    }

    fn emit(&self, event: LibraryEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Library(event));
        }
    }

    fn playlist_updated(&self, playlist: &Playlist) {
        self.emit(LibraryEvent::PlaylistUpdated {
            client_id: OFFLINE_EXTENSION_ID.to_string(),
            playlist_id: playlist.id.clone(),
        });
    }
}

impl fmt::Debug for OfflineExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfflineExtension")
            .field("id", &self.metadata.id)
            .field("tracks", &self.read(|library| library.len()).ok())
            .finish()
    }
}

// =============================================================================
// Feed helpers
// =============================================================================

fn genres(names: &[&str]) -> Vec<Genre> {
    names.iter().map(|name| Genre::named(name)).collect()
}

fn items<T: Into<MediaItem>>(values: impl IntoIterator<Item = T>) -> Vec<MediaItem> {
    values.into_iter().map(Into::into).collect()
}

fn containers(items: Vec<MediaItem>) -> Vec<MediaItemsContainer> {
    items.into_iter().map(MediaItemsContainer::item).collect()
}

fn sorted_by_title(mut items: Vec<MediaItem>) -> Vec<MediaItemsContainer> {
    items.sort_by_key(|item| item.title().to_lowercase());
    containers(items)
}

fn shuffled(mut items: Vec<MediaItem>) -> Vec<MediaItem> {
    items.shuffle(&mut rand::rng());
    items
}

/// `Category` for non-empty `items`.
fn shelf(title: &str, items: Vec<MediaItem>) -> Option<MediaItemsContainer> {
    (!items.is_empty()).then(|| MediaItemsContainer::category(title, items))
}

fn home_feed(library: &LibrarySnapshot, genre: Option<&str>) -> Vec<MediaItemsContainer> {
    match genre {
        Some("Songs") => sorted_by_title(items(library.tracks().cloned())),
        Some("Albums") => sorted_by_title(items(library.albums())),
        Some("Artists") => sorted_by_title(items(library.artists())),
        Some("Genres") => library
            .genres()
            .into_iter()
            .map(|(name, tracks)| MediaItemsContainer::category(name, items(tracks)))
            .collect(),
        _ => {
            let recent = items(library.recently_added().into_iter().take(SHELF_SIZE));
            let albums = shuffled(items(library.albums()));
            let artists = shuffled(items(library.artists()));

            [
                shelf("Recently Added", recent),
                shelf("Albums", albums.into_iter().take(SHELF_SIZE).collect()),
                shelf("Artists", artists.into_iter().take(SHELF_SIZE).collect()),
            ]
            .into_iter()
            .flatten()
            .chain(containers(items(library.tracks().cloned())))
            .collect()
        }
    }
}

struct SearchHits {
    tracks: Vec<(Rank, Track)>,
    albums: Vec<(Rank, Album)>,
    artists: Vec<(Rank, Artist)>,
}

fn artist_names(artists: &[Artist]) -> impl Iterator<Item = String> + '_ {
    artists.iter().map(|artist| artist.name.clone())
}

fn search_library(library: &LibrarySnapshot, query: &str) -> SearchHits {
    SearchHits {
        tracks: search_by(library.tracks().cloned().collect(), query, |track: &Track| {
            std::iter::once(track.title.clone())
                .chain(track.album.as_ref().map(|album| album.title.clone()))
                .chain(artist_names(&track.artists))
                .collect()
        }),
        albums: search_by(library.albums(), query, |album: &Album| {
            std::iter::once(album.title.clone())
                .chain(artist_names(&album.artists))
                .collect()
        }),
        artists: search_by(library.artists(), query, |artist: &Artist| vec![artist.name.clone()]),
    }
}

fn ranked_items<T: Into<MediaItem>>(hits: Vec<(Rank, T)>) -> (Option<Rank>, Vec<MediaItem>) {
    let best = hits.first().map(|(rank, _)| *rank);
    (best, hits.into_iter().map(|(_, item)| item.into()).collect())
}

fn search_feed(library: &LibrarySnapshot, query: &str, genre: Option<&str>) -> Vec<MediaItemsContainer> {
    let hits = search_library(library, query);
    match genre {
        Some("Tracks") => containers(ranked_items(hits.tracks).1),
        Some("Albums") => containers(ranked_items(hits.albums).1),
        Some("Artists") => containers(ranked_items(hits.artists).1),
        _ => {
            let mut shelves = vec![
                ("Tracks", ranked_items(hits.tracks)),
                ("Albums", ranked_items(hits.albums)),
                ("Artists", ranked_items(hits.artists)),
            ];
            shelves.retain(|(_, (_, items))| !items.is_empty());
            shelves.sort_by_key(|(_, (best, _))| best.unwrap_or(Rank::MAX));

            let needle = query.trim().to_lowercase();
            let top_result = shelves
                .iter()
                .flat_map(|(_, (_, items))| items.iter())
                .find(|item| item.title().to_lowercase().contains(&needle))
                .cloned()
                .map(MediaItemsContainer::item);

            top_result
                .into_iter()
                .chain(
                    shelves
                        .into_iter()
                        .map(|(title, (_, items))| MediaItemsContainer::category(title, items)),
                )
                .collect()
        }
    }
}

// =============================================================================
// Capabilities
// =============================================================================

#[async_trait]
impl Extension for OfflineExtension {
    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    async fn on_extension_selected(&self) -> Result<()> {
        self.reload().await?;
        Ok(())
    }

    fn as_track_client(&self) -> Option<&dyn TrackClient> {
        Some(self)
    }

    fn as_album_client(&self) -> Option<&dyn AlbumClient> {
        Some(self)
    }

    fn as_artist_client(&self) -> Option<&dyn ArtistClient> {
        Some(self)
    }

    fn as_playlist_client(&self) -> Option<&dyn PlaylistClient> {
        Some(self)
    }

    fn as_library_client(&self) -> Option<&dyn LibraryClient> {
        Some(self)
    }

    fn as_radio_client(&self) -> Option<&dyn RadioClient> {
        Some(self)
    }

    fn as_search_client(&self) -> Option<&dyn SearchClient> {
        Some(self)
    }

    fn as_home_feed_client(&self) -> Option<&dyn HomeFeedClient> {
        Some(self)
    }
}

#[async_trait]
impl TrackClient for OfflineExtension {
    async fn load_track(&self, track: &Track) -> Result<Track> {
        let scanned = self.read(|library| library.track(&track.id).cloned())?;
        Ok(scanned.unwrap_or_else(|| track.clone()))
    }

    async fn get_streamable_audio(&self, streamable: &Streamable) -> Result<StreamableAudio> {
        Ok(StreamableAudio::from_uri(streamable.id.clone()))
    }

    fn track_media_items(&self, track: &Track) -> PagedData<MediaItemsContainer> {
        let related: Vec<MediaItem> = track
            .album
            .iter()
            .cloned()
            .map(MediaItem::from)
            .chain(track.artists.iter().cloned().map(MediaItem::from))
            .collect();
        PagedData::single(containers(related))
    }
}

#[async_trait]
impl AlbumClient for OfflineExtension {
    async fn load_album(&self, album: &Album) -> Result<Album> {
        let loaded = self.read(|library| library.album(&album.id))?;
        Ok(loaded.ok_or_else(|| OfflineError::not_found("Album", &album.id))?)
    }

    fn album_media_items(&self, album: &Album) -> PagedData<MediaItemsContainer> {
        let album = album.clone();
        self.feed(move |library| {
            let mut feed = Vec::new();
            for artist in &album.artists {
                feed.push(MediaItemsContainer::item(artist.clone()));
                let more: Vec<Track> = library
                    .artist_tracks(&artist.id)
                    .into_iter()
                    .filter(|track| track.album.as_ref().map(|a| a.id.as_str()) != Some(album.id.as_str()))
                    .collect();
                feed.extend(shelf(&format!("More by {}", artist.name), items(more)));
            }
            feed
        })
    }
}

#[async_trait]
impl ArtistClient for OfflineExtension {
    async fn load_artist(&self, artist: &Artist) -> Result<Artist> {
        let loaded = self.read(|library| library.artist(&artist.id))?;
        Ok(loaded.ok_or_else(|| OfflineError::not_found("Artist", &artist.id))?)
    }

    async fn artist_tracks(&self, artist: &Artist) -> Result<Vec<Track>> {
        Ok(self.read(|library| library.artist_tracks(&artist.id))?)
    }

    fn artist_media_items(&self, artist: &Artist) -> PagedData<MediaItemsContainer> {
        let id = artist.id.clone();
        self.feed(move |library| {
            [
                shelf("Songs", items(library.artist_tracks(&id))),
                shelf("Albums", items(library.artist_albums(&id))),
            ]
            .into_iter()
            .flatten()
            .collect()
        })
    }
}

#[async_trait]
impl PlaylistClient for OfflineExtension {
    async fn load_playlist(&self, playlist: &Playlist) -> Result<Playlist> {
        let loaded = self.read(|library| library.playlist(&playlist.id).cloned())?;
        Ok(loaded.ok_or_else(|| OfflineError::not_found("Playlist", &playlist.id))?)
    }
}

#[async_trait]
impl RadioClient for OfflineExtension {
    async fn radio(&self, seed: &RadioSeed) -> Result<Playlist> {
        if !self.is_loaded() {
            return Err(OfflineError::LibraryNotLoaded.into());
        }
        Ok(self.radio.build(self, seed).await)
    }
}

#[async_trait]
impl SearchClient for OfflineExtension {
    async fn quick_search(&self, query: Option<&str>) -> Result<Vec<QuickSearchItem>> {
        let Some(query) = query.filter(|q| !q.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        let hits = self.read(|library| search_library(library, query))?;

        let mut ranked: Vec<(Rank, MediaItem)> = hits
            .tracks
            .into_iter()
            .map(|(rank, track)| (rank, MediaItem::from(track)))
            .chain(hits.albums.into_iter().map(|(rank, album)| (rank, MediaItem::from(album))))
            .chain(hits.artists.into_iter().map(|(rank, artist)| (rank, MediaItem::from(artist))))
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);

        Ok(ranked
            .into_iter()
            .take(QUICK_SEARCH_LIMIT)
            .map(|(_, item)| QuickSearchItem::Media { item })
            .collect())
    }

    async fn search_genres(&self, _query: Option<&str>) -> Result<Vec<Genre>> {
        Ok(genres(&SEARCH_GENRES))
    }

    fn search(&self, query: Option<&str>, genre: Option<&Genre>) -> PagedData<MediaItemsContainer> {
        let Some(query) = query.filter(|q| !q.trim().is_empty()) else {
            return PagedData::empty();
        };
        let genre = genre.map(|g| g.id.as_str());
        self.feed(|library| search_feed(library, query, genre))
    }
}

#[async_trait]
impl HomeFeedClient for OfflineExtension {
    async fn home_genres(&self) -> Result<Vec<Genre>> {
        Ok(genres(&HOME_GENRES))
    }

    fn home_feed(&self, genre: Option<&Genre>) -> PagedData<MediaItemsContainer> {
        let genre = genre.map(|g| g.id.as_str());
        self.feed(|library| home_feed(library, genre))
    }
}

#[async_trait]
impl LibraryClient for OfflineExtension {
    async fn library_genres(&self) -> Result<Vec<Genre>> {
        Ok(genres(&LIBRARY_GENRES))
    }

    fn library_feed(&self, _genre: Option<&Genre>) -> PagedData<MediaItemsContainer> {
        self.feed(|library| containers(items(library.playlists().iter().cloned())))
    }

    async fn library_tracks(&self) -> Result<Vec<Track>> {
        Ok(self.read(|library| library.tracks().cloned().collect())?)
    }

    async fn like_track(&self, track: &Track, liked: bool) -> Result<bool> {
        self.write(|library| library.set_liked(&track.id, liked))?;
        debug!(track_id = %track.id, liked, "Like stored");
        Ok(liked)
    }

    async fn create_playlist(&self, title: &str, description: Option<&str>) -> Result<Playlist> {
        let playlist = self.write(|library| Ok(library.create_playlist(title, description)))?;
        self.emit(LibraryEvent::PlaylistCreated {
            client_id: OFFLINE_EXTENSION_ID.to_string(),
            playlist_id: playlist.id.clone(),
            title: playlist.title.clone(),
        });
        Ok(playlist)
    }

    async fn delete_playlist(&self, playlist: &Playlist) -> Result<()> {
        self.write(|library| library.delete_playlist(&playlist.id))?;
        self.emit(LibraryEvent::PlaylistDeleted {
            client_id: OFFLINE_EXTENSION_ID.to_string(),
            playlist_id: playlist.id.clone(),
        });
        Ok(())
    }

    async fn add_tracks_to_playlist(&self, playlist: &Playlist, tracks: &[Track]) -> Result<()> {
        self.write(|library| library.add_to_playlist(&playlist.id, tracks))?;
        self.playlist_updated(playlist);
        Ok(())
    }

    async fn remove_tracks_from_playlist(&self, playlist: &Playlist, indexes: &[usize]) -> Result<()> {
        self.write(|library| library.remove_from_playlist(&playlist.id, indexes))?;
        self.playlist_updated(playlist);
        Ok(())
    }

    async fn move_track_in_playlist(&self, playlist: &Playlist, from: usize, to: usize) -> Result<()> {
        self.write(|library| library.move_in_playlist(&playlist.id, from, to))?;
        self.playlist_updated(playlist);
        Ok(())
    }
}
