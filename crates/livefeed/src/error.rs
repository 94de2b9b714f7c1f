//! Feed error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Errors that can occur on the live feed channel.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Connection-related errors (handshake, transport, teardown)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Frame encoding/decoding errors
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A command was issued while the channel was not connected
    #[error("Feed is not connected")]
    NotConnected,

    /// Endpoint URL errors
    #[error("Invalid feed URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FeedError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}
