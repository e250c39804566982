//! # Extension Model
//!
//! Media models, capability traits and the registry of pluggable music
//! backends.
//!
//! An [`Extension`] is a backend (local files, a streaming service) that
//! exposes some subset of the capability traits in [`clients`]. The
//! [`ExtensionRegistry`] tracks which extensions exist and which one is
//! currently selected.

pub mod clients;
pub mod error;
pub mod extension;
pub mod models;
pub mod paging;
pub mod registry;

pub use clients::{
    AlbumClient, ArtistClient, HomeFeedClient, LibraryClient, PlaylistClient, RadioClient,
    SearchClient, TrackClient, TrackerClient,
};
pub use error::{ExtensionError, Result};
pub use extension::Extension;
pub use models::{
    Album, Artist, ExtensionMetadata, Genre, MediaItem, MediaItemsContainer, Playlist,
    QuickSearchItem, RadioSeed, Streamable, StreamableAudio, Track, User,
};
pub use paging::{Page, PagedData};
pub use registry::{ExtensionRegistry, SharedExtension};
