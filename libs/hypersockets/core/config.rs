use std::time::Duration;

/// Default upper bound for a single inbound message
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1 << 20;

/// Default time allowed for the TCP + TLS + WebSocket upgrade
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for opening a WebSocket connection
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// WebSocket URL (wss:// or ws://)
    pub url: String,

    /// Largest single message accepted from the peer, in bytes
    pub max_message_size: usize,

    /// Upper bound for establishing the connection
    pub connect_timeout: Duration,
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Get a reference to the URL
    pub fn url(&self) -> &str {
        &self.url
    }
}
