//! # Radio Expansion
//!
//! Builds a shuffled, de-duplicated playlist of tracks related to a seed.
//!
//! Sources, for a track seed:
//! - the seed's album (as listed, or loaded through the album capability)
//! - every track by each of the seed's artists (artist capability)
//! - a random sample of the extension's library (library capability)
//!
//! Album and playlist seeds contribute their own track list, artist seeds
//! the artist listing; the library sample is always added. A source that is
//! unsupported or fails contributes nothing. Tracks are de-duplicated by id
//! and the seed track is never part of the result.

use core_extension::{Album, Artist, Extension, Playlist, RadioSeed, Track};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{debug, warn};

pub use core_runtime::config::DEFAULT_RADIO_SAMPLE_SIZE;

#[derive(Debug, Clone)]
pub struct RadioExpansion {
    sample_size: usize,
}

impl RadioExpansion {
    /// `sample_size` caps the number of random library tracks mixed in.
    pub fn new(sample_size: usize) -> Self {
        Self { sample_size }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Build the radio playlist for `seed` using `extension`'s capabilities.
    pub async fn build(&self, extension: &dyn Extension, seed: &RadioSeed) -> Playlist {
        let mut candidates = Vec::new();

        let (seed_track_id, subtitle) = match seed {
            RadioSeed::Track(track) => {
                if let Some(album) = &track.album {
                    candidates.extend(album_tracks(extension, album).await);
                }
                for artist in &track.artists {
                    candidates.extend(artist_tracks(extension, artist).await);
                }
                let subtitle = match track.first_artist_name() {
                    Some(artist) => format!("Radio based on {} by {}", track.title, artist),
                    None => format!("Radio based on {}", track.title),
                };
                (Some(track.id.as_str()), subtitle)
            }
            RadioSeed::Album(album) => {
                candidates.extend(album_tracks(extension, album).await);
                (None, format!("Radio based on {}", album.title))
            }
            RadioSeed::Artist(artist) => {
                candidates.extend(artist_tracks(extension, artist).await);
                (None, format!("Radio based on {}", artist.name))
            }
            RadioSeed::Playlist(playlist) => {
                candidates.extend(playlist_tracks(extension, playlist).await);
                (None, format!("Radio based on {}", playlist.title))
            }
        };

        candidates.extend(self.library_sample(extension).await);

        let tracks = dedupe_and_shuffle(candidates, seed_track_id);
        debug!(
            extension_id = extension.id(),
            seed = seed.title(),
            tracks = tracks.len(),
            "Radio built"
        );

        let mut playlist = Playlist::new("", format!("{} Radio", seed.title())).with_tracks(tracks);
        playlist.subtitle = Some(subtitle);
        playlist
    }

    async fn library_sample(&self, extension: &dyn Extension) -> Vec<Track> {
        let Some(library) = extension.as_library_client() else {
            return Vec::new();
        };
        match library.library_tracks().await {
            Ok(tracks) => sample(tracks, self.sample_size),
            Err(error) => {
                warn!(extension_id = extension.id(), error = %error, "Radio library sample failed");
                Vec::new()
            }
        }
    }
}

impl Default for RadioExpansion {
    fn default() -> Self {
        Self::new(DEFAULT_RADIO_SAMPLE_SIZE)
    }
}

async fn album_tracks(extension: &dyn Extension, album: &Album) -> Vec<Track> {
    if !album.tracks.is_empty() {
        return album.tracks.clone();
    }
    let Some(client) = extension.as_album_client() else {
        return Vec::new();
    };
    match client.load_album(album).await {
        Ok(loaded) => loaded.tracks,
        Err(error) => {
            warn!(album_id = %album.id, error = %error, "Radio album source failed");
            Vec::new()
        }
    }
}

async fn artist_tracks(extension: &dyn Extension, artist: &Artist) -> Vec<Track> {
    let Some(client) = extension.as_artist_client() else {
        return Vec::new();
    };
    match client.artist_tracks(artist).await {
        Ok(tracks) => tracks,
        Err(error) => {
            warn!(artist_id = %artist.id, error = %error, "Radio artist source failed");
            Vec::new()
        }
    }
}

async fn playlist_tracks(extension: &dyn Extension, playlist: &Playlist) -> Vec<Track> {
    if !playlist.tracks.is_empty() {
        return playlist.tracks.clone();
    }
    let Some(client) = extension.as_playlist_client() else {
        return Vec::new();
    };
    match client.load_playlist(playlist).await {
        Ok(loaded) => loaded.tracks,
        Err(error) => {
            warn!(playlist_id = %playlist.id, error = %error, "Radio playlist source failed");
            Vec::new()
        }
    }
}

/// Up to `size` tracks drawn uniformly from `tracks`.
fn sample(mut tracks: Vec<Track>, size: usize) -> Vec<Track> {
    tracks.shuffle(&mut rand::rng());
    tracks.truncate(size);
    tracks
}

fn dedupe_and_shuffle(candidates: Vec<Track>, seed_track_id: Option<&str>) -> Vec<Track> {
    let mut seen: HashSet<String> = seed_track_id.map(str::to_string).into_iter().collect();
    let mut tracks: Vec<Track> = candidates
        .into_iter()
        .filter(|track| seen.insert(track.id.clone()))
        .collect();
    tracks.shuffle(&mut rand::rng());
    tracks
}
