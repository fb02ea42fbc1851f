//! Pusher Client
//!
//! Real-time client for brokers speaking the Pusher channels protocol:
//! handshake, channel subscriptions, event delivery to bound queues and
//! keep-alive pings over one persistent connection.
//!
//! ```rust,ignore
//! use pusher::{PusherClient, ERR_EVENT};
//!
//! let client = PusherClient::connect("de504dc5763aeef9ff52").await?;
//! let trades = client.bind("trade")?;
//! let failures = client.bind(ERR_EVENT)?;
//! client.subscribe("live_trades").await?;
//!
//! while let Ok(envelope) = trades.recv() {
//!     println!("{}: {}", envelope.event, envelope.data);
//! }
//! client.close().await?;
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod registry;

// Re-export commonly used items
pub use client::{ClientEvent, ConnectionState, Metrics, PusherClient};
pub use config::{ClientConfig, ConfigError, MalformedFramePolicy, OverflowPolicy};
pub use dispatch::{Delivery, DispatchTable, EventQueue};
pub use error::{PusherError, Result};
pub use protocol::{Envelope, ERR_EVENT};
pub use registry::SubscriptionRegistry;
