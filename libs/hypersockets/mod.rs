//! # HyperSockets
//!
//! Transport layer for persistent message connections.
//!
//! ## Features
//!
//! - **Split halves**: a shareable write half and a single-owner read half
//! - **Prompt close**: closing the write half unblocks a parked read
//! - **Bounded frames**: per-connection maximum inbound message size
//! - **In-memory transport**: the same contract without a socket

pub mod traits;
pub mod core;

// Re-export all traits
pub use crate::traits::*;

// Re-export core transport functionality
pub use crate::core::{
    channel, close, config, websocket,
    channel::{channel_transport, ChannelPeer, ChannelSink, ChannelStream},
    close::{wait_closed, CloseSignal},
    config::ConnectOptions,
    websocket::{connect, WsReceiver, WsSink},
};
