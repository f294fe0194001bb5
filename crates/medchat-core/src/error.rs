//! Error taxonomy shared by every crate in the workspace.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, MedchatError>;

#[derive(Error, Debug)]
pub enum MedchatError {
    /// Empty or absent required field, malformed payload. Surfaced as a client error.
    #[error("{0}")]
    Validation(String),

    /// Bad or missing shared secret on an administrative endpoint.
    #[error("Unauthorized")]
    Unauthorized,

    /// Generative collaborator failed. Recovered locally by the composer.
    #[error("capability failure: {0}")]
    Capability(String),

    /// Knowledge store could not be read or written.
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl MedchatError {
    pub fn validation(msg: impl Into<String>) -> Self {
        MedchatError::Validation(msg.into())
    }

    /// True for errors the caller caused (bad input, bad credentials).
    pub fn is_client_error(&self) -> bool {
        matches!(self, MedchatError::Validation(_) | MedchatError::Unauthorized)
    }
}
