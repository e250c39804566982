//! # Offline Provider
//!
//! Extension serving the music stored on the device.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`OfflineExtension`], implementing every browsing, library, search and
//!   radio capability over an in-memory [`LibrarySnapshot`]
//! - [`LibraryScanner`], the host hook that produces the snapshot when the
//!   extension is selected
//! - Playlist editing and likes applied to the snapshot
//!
//! ```ignore
//! use provider_offline::OfflineExtension;
//!
//! let offline = Arc::new(OfflineExtension::new(scanner).with_event_bus(bus));
//! registry.register(offline).await?;
//! ```

pub mod error;
pub mod extension;
pub mod library;
mod search;

pub use error::{OfflineError, Result};
pub use extension::{OfflineExtension, OFFLINE_EXTENSION_ID};
pub use library::{LibraryScanner, LibrarySnapshot, LibraryTrack, LIKED_PLAYLIST_ID};
