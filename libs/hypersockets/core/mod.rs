//! # HyperSockets core
//!
//! Transports implementing [`FrameSink`](crate::FrameSink) and
//! [`FrameStream`](crate::FrameStream):
//!
//! - **websocket**: tokio-tungstenite connection, split into sink and receiver
//! - **channel**: in-memory connection with a scriptable remote peer
//!
//! Both share the same close semantics: closing the sink makes any pending
//! `recv()` on the stream return `ConnectionClosed`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hypersockets::{connect, ConnectOptions, FrameSink, FrameStream, WsMessage};
//!
//! let options = ConnectOptions::new("wss://ws.example.com/app/key")
//!     .max_message_size(11_000);
//! let (mut sink, mut stream) = connect(&options).await?;
//!
//! sink.send(WsMessage::Text("hello".into())).await?;
//! let reply = stream.recv().await?;
//! sink.close().await?;
//! ```

pub mod channel;
pub mod close;
pub mod config;
pub mod websocket;

// Re-export main types
pub use channel::{channel_transport, ChannelPeer, ChannelSink, ChannelStream};
pub use close::CloseSignal;
pub use config::ConnectOptions;
pub use websocket::{connect, WsReceiver, WsSink};
