//! Transport seams
//!
//! A connection is split into a write half ([`FrameSink`]) and a read half
//! ([`FrameStream`]) so that writers can share the sink behind a lock while
//! a single reader owns the stream.
//!
//! ```text
//!                 ┌──────────────┐
//! callers ──────> │  FrameSink   │ ──> socket
//! heartbeat ────> │ (send lock)  │
//!                 └──────┬───────┘
//!                        │ close() fires the close signal
//!                 ┌──────▼───────┐
//! socket ───────> │ FrameStream  │ ──> single reader task
//!                 └──────────────┘
//! ```
//!
//! Closing the sink must make a pending or future `recv()` on the paired
//! stream return [`HyperSocketError::ConnectionClosed`](crate::HyperSocketError)
//! promptly, whether or not the peer answers the close.

use crate::traits::error::Result;
use crate::traits::message::WsMessage;
use async_trait::async_trait;

/// Write half of a transport
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Send one frame
    async fn send(&mut self, message: WsMessage) -> Result<()>;

    /// Close the connection
    ///
    /// Must be safe to call more than once; calls after the first are no-ops.
    async fn close(&mut self) -> Result<()>;
}

/// Read half of a transport
#[async_trait]
pub trait FrameStream: Send {
    /// Wait for the next data frame
    ///
    /// Returns `Err(ConnectionClosed)` once the connection is closed by
    /// either side. Control frames of the underlying protocol are handled
    /// internally and never surface here.
    async fn recv(&mut self) -> Result<WsMessage>;
}

#[async_trait]
impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    async fn send(&mut self, message: WsMessage) -> Result<()> {
        (**self).send(message).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}

#[async_trait]
impl<T: FrameStream + ?Sized> FrameStream for Box<T> {
    async fn recv(&mut self) -> Result<WsMessage> {
        (**self).recv().await
    }
}
