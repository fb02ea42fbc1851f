use crate::config::ConfigError;
use hypersockets::HyperSocketError;
use thiserror::Error;

/// Main error type for the Pusher client
#[derive(Error, Debug)]
pub enum PusherError {
    /// Connect, read or write failure of the underlying transport
    #[error("Transport error: {0}")]
    Transport(#[from] HyperSocketError),

    /// The broker rejected the connection
    #[error("Pusher returned error: code {code}, message {message:?}")]
    Handshake { code: i64, message: String },

    /// First frame was neither a connection confirmation nor an error
    #[error("Unexpected handshake response: {0}")]
    UnexpectedHandshake(String),

    #[error("Channel {0} already subscribed")]
    AlreadySubscribed(String),

    #[error("Channel {0} not subscribed")]
    NotSubscribed(String),

    #[error("Event {0} already bound")]
    AlreadyBound(String),

    /// Malformed inbound frame
    #[error("Decode error: {0}")]
    Decode(String),

    /// Outbound frame could not be serialized
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The connection was closed with `close()`
    #[error("Connection stopped")]
    Stopped,
}

/// Result type for Pusher client operations
pub type Result<T> = std::result::Result<T, PusherError>;
