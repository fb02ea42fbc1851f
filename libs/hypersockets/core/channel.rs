//! In-memory transport
//!
//! [`channel_transport`] returns a sink/stream pair that behaves like a
//! WebSocket connection plus a [`ChannelPeer`] playing the remote side.
//! Useful for embedding a client behind an existing connection and for
//! driving protocol code in tests without a socket.

use crate::core::close::{wait_closed, CloseSignal};
use crate::traits::*;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

/// Write half of an in-memory connection
pub struct ChannelSink {
    outbound_tx: mpsc::UnboundedSender<WsMessage>,
    signal: CloseSignal,
}

/// Read half of an in-memory connection
pub struct ChannelStream {
    inbound_rx: mpsc::UnboundedReceiver<WsMessage>,
    closed: watch::Receiver<bool>,
    max_message_size: usize,
}

/// Remote side of an in-memory connection
pub struct ChannelPeer {
    inbound_tx: Option<mpsc::UnboundedSender<WsMessage>>,
    outbound_rx: mpsc::UnboundedReceiver<WsMessage>,
    signal: CloseSignal,
}

/// Create a connected in-memory transport
///
/// Frames larger than `max_message_size` pushed by the peer surface as
/// [`HyperSocketError::MessageTooLarge`] on the stream.
pub fn channel_transport(max_message_size: usize) -> (ChannelSink, ChannelStream, ChannelPeer) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let signal = CloseSignal::new();

    let sink = ChannelSink {
        outbound_tx,
        signal: signal.clone(),
    };
    let stream = ChannelStream {
        inbound_rx,
        closed: signal.watcher(),
        max_message_size,
    };
    let peer = ChannelPeer {
        inbound_tx: Some(inbound_tx),
        outbound_rx,
        signal,
    };
    (sink, stream, peer)
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, message: WsMessage) -> Result<()> {
        if self.signal.is_closed() {
            return Err(HyperSocketError::ConnectionClosed(
                "send after close".to_string(),
            ));
        }
        self.outbound_tx
            .send(message)
            .map_err(|_| HyperSocketError::ChannelSend("peer dropped".to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.signal.close();
        Ok(())
    }
}

#[async_trait]
impl FrameStream for ChannelStream {
    async fn recv(&mut self) -> Result<WsMessage> {
        if *self.closed.borrow() {
            return Err(HyperSocketError::ConnectionClosed(
                "closed locally".to_string(),
            ));
        }

        let next = tokio::select! {
            biased;
            _ = wait_closed(&mut self.closed) => {
                return Err(HyperSocketError::ConnectionClosed("closed locally".to_string()));
            }
            next = self.inbound_rx.recv() => next,
        };

        match next {
            Some(message) if message.len() > self.max_message_size => {
                Err(HyperSocketError::MessageTooLarge {
                    size: message.len(),
                    max: self.max_message_size,
                })
            }
            Some(message) => Ok(message),
            None => Err(HyperSocketError::ConnectionClosed(
                "peer disconnected".to_string(),
            )),
        }
    }
}

impl ChannelPeer {
    /// Push a frame to the local stream
    pub fn send(&self, message: impl Into<WsMessage>) -> Result<()> {
        match &self.inbound_tx {
            Some(tx) => tx
                .send(message.into())
                .map_err(|_| HyperSocketError::ChannelSend("stream dropped".to_string())),
            None => Err(HyperSocketError::ConnectionClosed(
                "peer disconnected".to_string(),
            )),
        }
    }

    /// Wait for the next frame written by the local sink
    ///
    /// Returns `None` once the sink is dropped and every frame was read.
    pub async fn recv(&mut self) -> Option<WsMessage> {
        self.outbound_rx.recv().await
    }

    /// Next frame written by the local sink, if one is already queued
    pub fn try_recv(&mut self) -> Option<WsMessage> {
        self.outbound_rx.try_recv().ok()
    }

    /// Drain every frame written so far
    pub fn drain(&mut self) -> Vec<WsMessage> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound_rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Drop the remote end; the local stream sees the connection end
    pub fn disconnect(&mut self) {
        self.inbound_tx = None;
    }

    /// Whether the local side has closed the connection
    pub fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }
}
