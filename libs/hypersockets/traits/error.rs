use thiserror::Error;

/// Main error type for hypersockets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HyperSocketError {
    /// WebSocket protocol or I/O error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed, either locally through `close()` or by the peer
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Inbound frame exceeds the configured maximum size
    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The endpoint could not be turned into a client request
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Channel send error (in-memory transport peer dropped)
    #[error("Channel send error: {0}")]
    ChannelSend(String),
}

impl HyperSocketError {
    /// True when the error is the result of the connection being closed
    pub fn is_closed(&self) -> bool {
        matches!(self, HyperSocketError::ConnectionClosed(_))
    }
}

/// Result type for hypersockets operations
pub type Result<T> = std::result::Result<T, HyperSocketError>;
