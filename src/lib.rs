//! Pusher Feed - Main Library
//!
//! Workspace entry point for the Pusher real-time client.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (config, logging, shutdown)
//! - **pusher**: Pusher protocol client (re-exported from workspace)
//! - **hypersockets**: WebSocket transport (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use pusher_feed::bin_common::{init_tracing, load_client_config, load_config_from_env, ConfigType};
//! use pusher_feed::pusher::PusherClient;
//! ```

// Re-export workspace libraries for convenience
pub use hypersockets;
pub use pusher;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod logging;
    pub mod shutdown;

    pub use cli::{
        app_key_from_env, load_client_config, load_config_from_env, parse_args, ConfigType,
    };
    pub use logging::init_tracing;
    pub use shutdown::ShutdownManager;
}
