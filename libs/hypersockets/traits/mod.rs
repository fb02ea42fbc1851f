//! # HyperSockets Traits
//!
//! Core traits and types for the HyperSockets transport layer:
//!
//! - **WsMessage**: A text or binary data frame
//! - **FrameSink**: Write half of a connection
//! - **FrameStream**: Read half of a connection
//! - **HyperSocketError**: Transport error type

pub mod error;
pub mod message;
pub mod transport;

// Re-export commonly used types
pub use error::{HyperSocketError, Result};
pub use message::WsMessage;
pub use transport::{FrameSink, FrameStream};
