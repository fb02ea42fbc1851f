use crate::protocol::{self, DEFAULT_HOST, DEFAULT_SCHEME, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// What the listen loop does when a bound queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the incoming envelope, keep what is queued
    #[default]
    DropNewest,
    /// Evict the oldest queued envelope to make room
    DropOldest,
    /// Hold the listen loop until the consumer makes room.
    /// Every other event stalls meanwhile.
    Block,
}

/// What the listen loop does with a frame it cannot decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedFramePolicy {
    /// Treat it like a read failure: report and stop listening
    #[default]
    Terminate,
    /// Log it and keep reading
    Skip,
}

/// Connection tuning
///
/// Every knob that used to be a process-wide constant lives here, so
/// connections with different settings can coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Broker host, with port
    pub host: String,
    /// `wss` or `ws`
    pub scheme: String,
    pub protocol_version: String,
    /// Capacity of each bound event queue
    pub event_buffer_size: usize,
    pub heartbeat_interval_secs: u64,
    /// Largest inbound frame accepted, in bytes
    pub max_message_size: usize,
    pub handshake_timeout_secs: u64,
    pub overflow_policy: OverflowPolicy,
    pub malformed_frame_policy: MalformedFramePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            event_buffer_size: 1000,
            heartbeat_interval_secs: 30,
            max_message_size: MAX_MESSAGE_SIZE,
            handshake_timeout_secs: 10,
            overflow_policy: OverflowPolicy::default(),
            malformed_frame_policy: MalformedFramePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Default tuning against a custom broker
    pub fn custom(host: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme: scheme.into(),
            ..Self::default()
        }
    }

    /// Load and validate configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading client configuration from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("host must not be empty".into()));
        }
        if self.scheme != "ws" && self.scheme != "wss" {
            return Err(ConfigError::ValidationError(format!(
                "scheme must be ws or wss, got {:?}",
                self.scheme
            )));
        }
        if self.protocol_version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "protocol_version must not be empty".into(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "event_buffer_size must be at least 1".into(),
            ));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "heartbeat_interval_secs must be at least 1".into(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_message_size must be at least 1".into(),
            ));
        }
        if self.handshake_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "handshake_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Connection URL for an application key
    pub fn endpoint(&self, app_key: &str) -> String {
        protocol::endpoint(&self.scheme, &self.host, app_key, &self.protocol_version)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}
