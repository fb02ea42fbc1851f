//! WebSocket transport on top of tokio-tungstenite
//!
//! [`connect`] opens the socket and splits it into a [`WsSink`] and a
//! [`WsReceiver`]. Protocol-level ping/pong frames are answered by
//! tungstenite itself; only text and binary frames reach the caller.

use crate::core::close::{wait_closed, CloseSignal};
use crate::core::config::ConnectOptions;
use crate::traits::*;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::{CapacityError, Error as WsError};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound for flushing the close frame
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Write half of a WebSocket connection
pub struct WsSink {
    write: SplitSink<WsStream, Message>,
    signal: CloseSignal,
}

/// Read half of a WebSocket connection
pub struct WsReceiver {
    read: SplitStream<WsStream>,
    closed: watch::Receiver<bool>,
}

/// Open a WebSocket connection and split it into its two halves
pub async fn connect(options: &ConnectOptions) -> Result<(WsSink, WsReceiver)> {
    let request = options
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| HyperSocketError::InvalidUrl(e.to_string()))?;

    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(options.max_message_size);

    debug!("Connecting to {}", options.url);
    let (ws_stream, _response) = tokio::time::timeout(
        options.connect_timeout,
        connect_async_with_config(request, Some(ws_config), false),
    )
    .await
    .map_err(|_| {
        HyperSocketError::Timeout(format!(
            "connecting to {} took longer than {:?}",
            options.url, options.connect_timeout
        ))
    })?
    .map_err(map_ws_error)?;

    info!("Connected to {}", options.url);
    Ok(split(ws_stream))
}

/// Split an established stream into sink and receiver sharing one close signal
fn split(ws_stream: WsStream) -> (WsSink, WsReceiver) {
    let signal = CloseSignal::new();
    let closed = signal.watcher();
    let (write, read) = ws_stream.split();
    (WsSink { write, signal }, WsReceiver { read, closed })
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, message: WsMessage) -> Result<()> {
        if self.signal.is_closed() {
            return Err(HyperSocketError::ConnectionClosed(
                "send after close".to_string(),
            ));
        }
        self.write
            .send(ws_message_to_tungstenite(message))
            .await
            .map_err(map_ws_error)
    }

    async fn close(&mut self) -> Result<()> {
        if !self.signal.close() {
            return Ok(());
        }
        debug!("Closing WebSocket connection");

        match tokio::time::timeout(CLOSE_TIMEOUT, self.write.close()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => match map_ws_error(e) {
                // The peer beat us to it
                HyperSocketError::ConnectionClosed(_) => Ok(()),
                other => Err(other),
            },
            Err(_) => {
                warn!("Timed out flushing WebSocket close frame");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl FrameStream for WsReceiver {
    async fn recv(&mut self) -> Result<WsMessage> {
        loop {
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
                next = self.read.next() => next,
            };

            match next {
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("{} {}", f.code, f.reason))
                        .unwrap_or_else(|| "no close frame".to_string());
                    return Err(HyperSocketError::ConnectionClosed(format!(
                        "closed by peer: {}",
                        reason
                    )));
                }
                Some(Ok(msg)) => {
                    if let Some(ws_msg) = tungstenite_to_ws_message(msg) {
                        return Ok(ws_msg);
                    }
                }
                Some(Err(e)) => return Err(map_ws_error(e)),
                None => {
                    return Err(HyperSocketError::ConnectionClosed(
                        "stream ended".to_string(),
                    ))
                }
            }
        }
    }
}

fn map_ws_error(e: WsError) -> HyperSocketError {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            HyperSocketError::ConnectionClosed(e.to_string())
        }
        WsError::Capacity(CapacityError::MessageTooLong { size, max_size }) => {
            HyperSocketError::MessageTooLarge {
                size,
                max: max_size,
            }
        }
        other => HyperSocketError::WebSocket(other.to_string()),
    }
}

/// Convert WsMessage to tungstenite Message
fn ws_message_to_tungstenite(msg: WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text),
        WsMessage::Binary(data) => Message::Binary(data),
    }
}

/// Convert tungstenite Message to WsMessage
fn tungstenite_to_ws_message(msg: Message) -> Option<WsMessage> {
    match msg {
        Message::Text(text) => Some(WsMessage::Text(text)),
        Message::Binary(data) => Some(WsMessage::Binary(data)),
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_conversion() {
        let text = ws_message_to_tungstenite(WsMessage::Text("hi".to_string()));
        assert_eq!(
            tungstenite_to_ws_message(text),
            Some(WsMessage::Text("hi".to_string()))
        );

        let binary = ws_message_to_tungstenite(WsMessage::Binary(vec![7, 8]));
        assert_eq!(
            tungstenite_to_ws_message(binary),
            Some(WsMessage::Binary(vec![7, 8]))
        );

        assert_eq!(tungstenite_to_ws_message(Message::Ping(vec![1])), None);
        assert_eq!(tungstenite_to_ws_message(Message::Pong(vec![1])), None);
    }

    #[test]
    fn test_error_mapping() {
        assert!(map_ws_error(WsError::ConnectionClosed).is_closed());
        assert!(map_ws_error(WsError::AlreadyClosed).is_closed());
        assert_eq!(
            map_ws_error(WsError::Capacity(CapacityError::MessageTooLong {
                size: 20_000,
                max_size: 11_000,
            })),
            HyperSocketError::MessageTooLarge {
                size: 20_000,
                max: 11_000
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let options = ConnectOptions::new("not a url");
        match connect(&options).await {
            Err(HyperSocketError::InvalidUrl(_)) => {}
            Err(other) => panic!("expected InvalidUrl, got {other}"),
            Ok(_) => panic!("expected InvalidUrl, got a connection"),
        }
    }
}
