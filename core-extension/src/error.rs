//! Errors raised by extension capability calls.

use thiserror::Error;

/// Failure reported by an extension.
///
/// Extensions may build these directly or convert any `anyhow::Error`.
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// The extension does not implement the requested operation.
    #[error("Operation not supported by {extension}: {operation}")]
    NotSupported { extension: String, operation: String },

    /// The referenced item does not exist in the extension.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// The call arguments were rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The extension is not ready (e.g., library not loaded yet) or its
    /// backend is unreachable.
    #[error("Extension unavailable: {0}")]
    Unavailable(String),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExtensionError {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn not_supported(extension: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::NotSupported {
            extension: extension.into(),
            operation: operation.into(),
        }
    }

    /// Returns `true` if retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtensionError::Unavailable(_))
    }
}

/// Result type for extension calls.
pub type Result<T> = std::result::Result<T, ExtensionError>;
