//! Error types for the offline provider

use core_extension::ExtensionError;
use thiserror::Error;

/// Offline library errors
#[derive(Error, Debug)]
pub enum OfflineError {
    /// The extension has not been selected yet, so no library was scanned
    #[error("Offline library has not been loaded")]
    LibraryNotLoaded,

    /// The injected scanner failed
    #[error("Library scan failed: {0}")]
    Scan(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Attempted to edit a playlist the library manages itself
    #[error("Playlist is not editable: {0}")]
    PlaylistNotEditable(String),

    #[error("Index {index} out of range for playlist of {len} tracks")]
    InvalidIndex { index: usize, len: usize },
}

impl OfflineError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result type for offline library operations
pub type Result<T> = std::result::Result<T, OfflineError>;

impl From<OfflineError> for ExtensionError {
    fn from(error: OfflineError) -> Self {
        match error {
            OfflineError::LibraryNotLoaded | OfflineError::Scan(_) => {
                ExtensionError::Unavailable(error.to_string())
            }
            OfflineError::NotFound { kind, id } => ExtensionError::not_found(kind, id),
            OfflineError::PlaylistNotEditable(_) | OfflineError::InvalidIndex { .. } => {
                ExtensionError::InvalidInput(error.to_string())
            }
        }
    }
}
