//! Error taxonomy shared by every layer of the crate.
//!
//! Four categories, matched to how the HTTP surface reports them: bad
//! input from the caller, a lookup that found nothing, a remote service
//! misbehaving, and configuration problems that abort startup.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The caller's request was invalid.
    #[error("invalid request: {0}")]
    Client(String),

    /// A lookup completed but found nothing.
    #[error("{0}")]
    NotFound(String),

    /// A remote service failed or returned something unusable.
    #[error("{0}")]
    Platform(String),

    /// Required configuration is missing or malformed. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::Platform(err.to_string())
    }
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, AgentError>;
