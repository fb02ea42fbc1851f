//! CLI utilities for binaries
//!
//! Handles configuration loading and environment variables
//! for all binary executables.

use pusher::{ClientConfig, ConfigError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Application key used when `PUSHER_APP_KEY` is unset (Bitstamp's public feed)
pub const DEFAULT_APP_KEY: &str = "de504dc5763aeef9ff52";

/// Environment variable holding the application key
pub const APP_KEY_ENV: &str = "PUSHER_APP_KEY";

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Client configuration (config/pusher.yaml)
    Client,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Client => "config/pusher.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        "PUSHER_CONFIG_PATH"
    }
}

/// Load configuration path from environment or use default
///
/// A custom path always wins over the environment.
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    if let ConfigType::Custom(path) = &config_type {
        return PathBuf::from(path);
    }
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Load the client configuration, falling back to defaults when the file is absent
pub fn load_client_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    if !path.exists() {
        info!(
            "No configuration at {}, using defaults",
            path.display()
        );
        return Ok(ClientConfig::default());
    }
    ClientConfig::from_yaml_file(path)
}

/// Application key from `PUSHER_APP_KEY`, or the public default
pub fn app_key_from_env() -> String {
    std::env::var(APP_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_APP_KEY.to_string())
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}
