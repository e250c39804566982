//! In-memory view of the device library.
//!
//! A [`LibraryScanner`] supplied by the host produces a [`LibrarySnapshot`]:
//! every local track with the time it was added and its genre, plus the
//! user's playlists. Albums, artists and genre shelves are derived from the
//! tracks. Likes are kept in a dedicated, non-editable "Liked" playlist.

use async_trait::async_trait;
use core_extension::{Album, Artist, Playlist, Track};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{OfflineError, Result};

/// Id of the playlist holding liked tracks.
pub const LIKED_PLAYLIST_ID: &str = "liked";

/// Produces the device library. Scanning itself belongs to the host.
#[async_trait]
pub trait LibraryScanner: Send + Sync {
    async fn scan(&self) -> Result<LibrarySnapshot>;
}

/// A local track as found by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryTrack {
    pub track: Track,
    /// Unix milliseconds of the last file modification.
    pub added_at: i64,
    pub genre: Option<String>,
}

impl LibraryTrack {
    pub fn new(track: Track, added_at: i64) -> Self {
        Self {
            track,
            added_at,
            genre: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    tracks: Vec<LibraryTrack>,
    playlists: Vec<Playlist>,
}

impl LibrarySnapshot {
    /// Tracks already marked as liked seed the "Liked" playlist.
    pub fn new(tracks: Vec<LibraryTrack>) -> Self {
        let liked = Playlist::new(LIKED_PLAYLIST_ID, "Liked").with_tracks(
            tracks
                .iter()
                .filter(|t| t.track.liked)
                .map(|t| t.track.clone())
                .collect(),
        );

        Self {
            tracks,
            playlists: vec![liked],
        }
    }

    /// Add user playlists. A playlist reusing the liked playlist id is
    /// ignored.
    pub fn with_playlists(mut self, playlists: Vec<Playlist>) -> Self {
        self.playlists.extend(
            playlists
                .into_iter()
                .filter(|playlist| playlist.id != LIKED_PLAYLIST_ID),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    // -------------------------------------------------------------------------
    // Tracks
    // -------------------------------------------------------------------------

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().map(|t| &t.track)
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks().find(|track| track.id == id)
    }

    /// All tracks, newest first.
    pub fn recently_added(&self) -> Vec<Track> {
        let mut tracks: Vec<&LibraryTrack> = self.tracks.iter().collect();
        tracks.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        tracks.into_iter().map(|t| t.track.clone()).collect()
    }

    /// Genre names with their tracks, in order of first appearance.
    pub fn genres(&self) -> Vec<(String, Vec<Track>)> {
        let mut genres: Vec<(String, Vec<Track>)> = Vec::new();
        for entry in &self.tracks {
            let Some(genre) = &entry.genre else {
                continue;
            };
            match genres.iter_mut().find(|(name, _)| name == genre) {
                Some((_, tracks)) => tracks.push(entry.track.clone()),
                None => genres.push((genre.clone(), vec![entry.track.clone()])),
            }
        }
        genres
    }

    // -------------------------------------------------------------------------
    // Albums and artists
    // -------------------------------------------------------------------------

    /// Albums in order of first appearance, each with its tracks.
    pub fn albums(&self) -> Vec<Album> {
        let mut albums: Vec<Album> = Vec::new();
        for track in self.tracks() {
            let Some(album) = &track.album else {
                continue;
            };
            let index = match albums.iter().position(|a| a.id == album.id) {
                Some(index) => index,
                None => {
                    let mut shell = album.clone();
                    shell.tracks.clear();
                    albums.push(shell);
                    albums.len() - 1
                }
            };
            let entry = &mut albums[index];
            for artist in &track.artists {
                if !entry.artists.iter().any(|a| a.id == artist.id) {
                    entry.artists.push(artist.clone());
                }
            }
            entry.tracks.push(track.clone());
        }
        albums
    }

    pub fn album(&self, id: &str) -> Option<Album> {
        self.albums().into_iter().find(|album| album.id == id)
    }

    /// Artists in order of first appearance.
    pub fn artists(&self) -> Vec<Artist> {
        let mut seen = HashSet::new();
        self.tracks()
            .flat_map(|track| track.artists.iter())
            .filter(|artist| seen.insert(artist.id.clone()))
            .cloned()
            .collect()
    }

    pub fn artist(&self, id: &str) -> Option<Artist> {
        self.tracks()
            .flat_map(|track| track.artists.iter())
            .find(|artist| artist.id == id)
            .cloned()
    }

    pub fn artist_tracks(&self, id: &str) -> Vec<Track> {
        self.tracks()
            .filter(|track| track.artists.iter().any(|artist| artist.id == id))
            .cloned()
            .collect()
    }

    pub fn artist_albums(&self, id: &str) -> Vec<Album> {
        self.albums()
            .into_iter()
            .filter(|album| album.artists.iter().any(|artist| artist.id == id))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Playlists
    // -------------------------------------------------------------------------

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|playlist| playlist.id == id)
    }

    fn editable_playlist_mut(&mut self, id: &str) -> Result<&mut Playlist> {
        let playlist = self
            .playlists
            .iter_mut()
            .find(|playlist| playlist.id == id)
            .ok_or_else(|| OfflineError::not_found("Playlist", id))?;
        if !playlist.is_editable {
            return Err(OfflineError::PlaylistNotEditable(id.to_string()));
        }
        Ok(playlist)
    }

    pub fn create_playlist(&mut self, title: &str, description: Option<&str>) -> Playlist {
        let mut playlist = Playlist::new(uuid::Uuid::new_v4().to_string(), title);
        playlist.is_editable = true;
        playlist.subtitle = description.map(str::to_string);
        self.playlists.push(playlist.clone());
        playlist
    }

    pub fn delete_playlist(&mut self, id: &str) -> Result<()> {
        self.editable_playlist_mut(id)?;
        self.playlists.retain(|playlist| playlist.id != id);
        Ok(())
    }

    pub fn add_to_playlist(&mut self, id: &str, tracks: &[Track]) -> Result<()> {
        self.editable_playlist_mut(id)?.tracks.extend_from_slice(tracks);
        Ok(())
    }

    /// Remove the tracks at `indexes` (positions before any removal).
    pub fn remove_from_playlist(&mut self, id: &str, indexes: &[usize]) -> Result<()> {
        let playlist = self.editable_playlist_mut(id)?;
        let len = playlist.tracks.len();
        if let Some(&index) = indexes.iter().find(|&&index| index >= len) {
            return Err(OfflineError::InvalidIndex { index, len });
        }

        let mut sorted = indexes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for index in sorted.into_iter().rev() {
            playlist.tracks.remove(index);
        }
        Ok(())
    }

    pub fn move_in_playlist(&mut self, id: &str, from: usize, to: usize) -> Result<()> {
        let playlist = self.editable_playlist_mut(id)?;
        let len = playlist.tracks.len();
        for index in [from, to] {
            if index >= len {
                return Err(OfflineError::InvalidIndex { index, len });
            }
        }
        let track = playlist.tracks.remove(from);
        playlist.tracks.insert(to, track);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Likes
    // -------------------------------------------------------------------------

    /// Like or unlike track `id`. Newly liked tracks go to the top of the
    /// liked playlist.
    pub fn set_liked(&mut self, id: &str, liked: bool) -> Result<()> {
        let entry = self
            .tracks
            .iter_mut()
            .find(|t| t.track.id == id)
            .ok_or_else(|| OfflineError::not_found("Track", id))?;
        entry.track.liked = liked;
        let track = entry.track.clone();

        let playlist = self
            .playlists
            .iter_mut()
            .find(|playlist| playlist.id == LIKED_PLAYLIST_ID)
            .ok_or_else(|| OfflineError::not_found("Playlist", LIKED_PLAYLIST_ID))?;
        playlist.tracks.retain(|t| t.id != id);
        if liked {
            playlist.tracks.insert(0, track);
        }
        Ok(())
    }
}
