//! Integration tests for radio expansion
//!
//! Radio output is shuffled, so these tests compare id sets and check that
//! the seed and duplicates never appear.

use async_trait::async_trait;
use core_extension::{
    Album, AlbumClient, Artist, ArtistClient, Extension, ExtensionError, ExtensionMetadata,
    Genre, LibraryClient, MediaItemsContainer, PagedData, Playlist, RadioSeed, Result, Track,
};
use core_playback::RadioExpansion;
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// Test Extension
// ============================================================================

/// Catalogue extension with album, artist and library capabilities.
struct CatalogueExtension {
    metadata: ExtensionMetadata,
    albums: HashMap<String, Vec<Track>>,
    artists: HashMap<String, Vec<Track>>,
    library: Vec<Track>,
    fail_artists: bool,
}

impl CatalogueExtension {
    fn new() -> Self {
        let mut albums = HashMap::new();
        albums.insert("al1".to_string(), tracks(&["seed", "a1", "a2"]));

        let mut artists = HashMap::new();
        artists.insert("ar1".to_string(), tracks(&["a1", "b1", "b2"]));
        artists.insert("ar2".to_string(), tracks(&["c1"]));

        Self {
            metadata: ExtensionMetadata::new("cat", "Catalogue"),
            albums,
            artists,
            library: tracks(&["l1", "l2", "a2"]),
            fail_artists: false,
        }
    }
}

fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| Track::new(*id, format!("Song {id}"))).collect()
}

fn ids(playlist: &Playlist) -> BTreeSet<String> {
    playlist.tracks.iter().map(|t| t.id.clone()).collect()
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn assert_no_duplicates(playlist: &Playlist) {
    assert_eq!(ids(playlist).len(), playlist.tracks.len());
}

#[async_trait]
impl AlbumClient for CatalogueExtension {
    async fn load_album(&self, album: &Album) -> Result<Album> {
        let tracks = self
            .albums
            .get(&album.id)
            .cloned()
            .ok_or_else(|| ExtensionError::not_found("Album", &album.id))?;
        Ok(album.clone().with_tracks(tracks))
    }
}

#[async_trait]
impl ArtistClient for CatalogueExtension {
    async fn load_artist(&self, artist: &Artist) -> Result<Artist> {
        Ok(artist.clone())
    }

    async fn artist_tracks(&self, artist: &Artist) -> Result<Vec<Track>> {
        if self.fail_artists {
            return Err(ExtensionError::Unavailable("artist service".to_string()));
        }
        Ok(self.artists.get(&artist.id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl LibraryClient for CatalogueExtension {
    async fn library_genres(&self) -> Result<Vec<Genre>> {
        Ok(Vec::new())
    }

    fn library_feed(&self, _genre: Option<&Genre>) -> PagedData<MediaItemsContainer> {
        PagedData::empty()
    }

    async fn library_tracks(&self) -> Result<Vec<Track>> {
        Ok(self.library.clone())
    }

    async fn like_track(&self, _track: &Track, liked: bool) -> Result<bool> {
        Ok(liked)
    }

    async fn create_playlist(&self, title: &str, _description: Option<&str>) -> Result<Playlist> {
        Ok(Playlist::new(title, title))
    }

    async fn delete_playlist(&self, _playlist: &Playlist) -> Result<()> {
        Ok(())
    }

    async fn add_tracks_to_playlist(&self, _playlist: &Playlist, _tracks: &[Track]) -> Result<()> {
        Ok(())
    }

    async fn remove_tracks_from_playlist(
        &self,
        _playlist: &Playlist,
        _indexes: &[usize],
    ) -> Result<()> {
        Ok(())
    }

    async fn move_track_in_playlist(
        &self,
        _playlist: &Playlist,
        _from: usize,
        _to: usize,
    ) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Extension for CatalogueExtension {
    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    fn as_album_client(&self) -> Option<&dyn AlbumClient> {
        Some(self)
    }

    fn as_artist_client(&self) -> Option<&dyn ArtistClient> {
        Some(self)
    }

    fn as_library_client(&self) -> Option<&dyn LibraryClient> {
        Some(self)
    }
}

/// Extension with no capabilities at all.
struct EmptyExtension {
    metadata: ExtensionMetadata,
}

#[async_trait]
impl Extension for EmptyExtension {
    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }
}

fn seed_track() -> Track {
    Track::new("seed", "Seed Song")
        .with_album(Album::new("al1", "Album"))
        .with_artist(Artist::new("ar1", "First"))
        .with_artist(Artist::new("ar2", "Second"))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_track_seed_unions_all_sources() {
    let extension = CatalogueExtension::new();
    let radio = RadioExpansion::new(25);

    let playlist = radio
        .build(&extension, &RadioSeed::Track(seed_track()))
        .await;

    assert_eq!(
        ids(&playlist),
        set(&["a1", "a2", "b1", "b2", "c1", "l1", "l2"])
    );
    assert_no_duplicates(&playlist);
    assert_eq!(playlist.title, "Seed Song Radio");
    assert_eq!(
        playlist.subtitle.as_deref(),
        Some("Radio based on Seed Song by First")
    );
    assert_eq!(playlist.id, "");
    assert!(!playlist.is_editable);
}

#[tokio::test]
async fn test_failing_source_contributes_nothing() {
    let extension = CatalogueExtension {
        fail_artists: true,
        ..CatalogueExtension::new()
    };

    let playlist = RadioExpansion::new(25)
        .build(&extension, &RadioSeed::Track(seed_track()))
        .await;

    assert_eq!(ids(&playlist), set(&["a1", "a2", "l1", "l2"]));
    assert!(!ids(&playlist).contains("seed"));
}

#[tokio::test]
async fn test_library_sample_is_capped() {
    let extension = CatalogueExtension {
        library: tracks(&["l1", "l2", "l3", "l4", "l5", "l6"]),
        ..CatalogueExtension::new()
    };

    let playlist = RadioExpansion::new(2)
        .build(&extension, &RadioSeed::Artist(Artist::new("ar2", "Second")))
        .await;

    assert_eq!(playlist.tracks.len(), 3);
    assert!(ids(&playlist).contains("c1"));
    assert_eq!(playlist.subtitle.as_deref(), Some("Radio based on Second"));
}

#[tokio::test]
async fn test_album_and_playlist_seeds_use_own_tracks() {
    let extension = CatalogueExtension::new();
    let radio = RadioExpansion::new(25);

    let album = radio
        .build(&extension, &RadioSeed::Album(Album::new("al1", "Album")))
        .await;
    assert_eq!(ids(&album), set(&["seed", "a1", "a2", "l1", "l2"]));
    assert_eq!(album.title, "Album Radio");

    let playlist_seed = Playlist::new("p1", "Mix").with_tracks(tracks(&["x1", "x1", "l1"]));
    let playlist = radio
        .build(&extension, &RadioSeed::Playlist(playlist_seed))
        .await;
    assert_eq!(ids(&playlist), set(&["x1", "l1", "l2", "a2"]));
    assert_no_duplicates(&playlist);
}

#[tokio::test]
async fn test_extension_without_capabilities_builds_empty_radio() {
    let extension = EmptyExtension {
        metadata: ExtensionMetadata::new("empty", "Empty"),
    };

    let playlist = RadioExpansion::default()
        .build(&extension, &RadioSeed::Track(seed_track()))
        .await;

    assert!(playlist.tracks.is_empty());
    assert_eq!(playlist.title, "Seed Song Radio");
}
