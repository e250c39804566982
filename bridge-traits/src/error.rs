use thiserror::Error;

/// Failure reported by a host bridge implementation.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host does not provide this bridge.
    #[error("Bridge not available on this host: {0}")]
    NotAvailable(String),

    #[error("Bridge call failed: {0}")]
    OperationFailed(String),

    /// Settings or track cache persistence failed.
    #[error("Storage failure: {0}")]
    StorageError(String),

    /// The media player rejected a command.
    #[error("Player rejected command: {0}")]
    PlayerError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
