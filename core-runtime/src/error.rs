use thiserror::Error;

/// Errors raised while configuring and starting the core.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value was rejected during validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A required host bridge was not provided.
    #[error("Missing {capability} bridge: {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Runtime failure: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
