//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `TrackCacheStore` using a SQLite blob table
//!
//! Both stores can share one database file. The host player adapter is not
//! provided here: desktop hosts bring their own media engine.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{default_database_path, SqliteSettingsStore, SqliteTrackCacheStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let path = default_database_path();
//!     let settings = SqliteSettingsStore::new(path.clone()).await.unwrap();
//!     let cache = SqliteTrackCacheStore::new(path).await.unwrap();
//!
//!     // Use in core configuration
//! }
//! ```

mod db;
mod settings;
mod track_cache;

pub use db::default_database_path;
pub use settings::SqliteSettingsStore;
pub use track_cache::SqliteTrackCacheStore;
