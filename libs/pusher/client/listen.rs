//! Listen loop
//!
//! The only reader of the stream. One frame is fully handled, ping answered
//! or envelope delivered, before the next one is read, so per-queue order
//! matches wire order.

use super::{ClientEvent, Shared};
use crate::config::MalformedFramePolicy;
use crate::error::PusherError;
use crate::protocol::{decode, ControlFrame, Envelope, Inbound, ERR_EVENT};
use hypersockets::{wait_closed, FrameStream, WsMessage};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub(crate) async fn listen_loop(shared: Arc<Shared>, mut stream: Box<dyn FrameStream>) {
    let mut shutdown = shared.shutdown.watcher();
    debug!("Listen loop started");

    loop {
        if shared.stopped() {
            break;
        }

        let received = tokio::select! {
            biased;
            _ = wait_closed(&mut shutdown) => break,
            received = stream.recv() => received,
        };
        let message = match received {
            Ok(message) => message,
            Err(e) => {
                terminate(&shared, e.into()).await;
                break;
            }
        };
        shared.metrics.increment_received();

        let text = match message {
            WsMessage::Text(text) => text,
            WsMessage::Binary(data) => {
                debug!("Ignoring binary frame ({} bytes)", data.len());
                continue;
            }
        };

        let inbound = match decode(&text) {
            Ok(inbound) => inbound,
            Err(e) => match shared.config.malformed_frame_policy {
                MalformedFramePolicy::Skip => {
                    warn!("Skipping malformed frame: {}", e);
                    continue;
                }
                MalformedFramePolicy::Terminate => {
                    terminate(&shared, e).await;
                    break;
                }
            },
        };

        match inbound {
            Inbound::Ping => {
                debug!("Ping received, answering");
                if let Err(e) = shared.send_frame(ControlFrame::Pong).await {
                    if shared.stopped() {
                        break;
                    }
                    warn!("Failed to answer ping: {}", e);
                }
            }
            Inbound::Pong => debug!("Pong received"),
            Inbound::Error(server_error) => {
                warn!(
                    "Pusher error: code {}, message {:?}",
                    server_error.code, server_error.message
                );
                shared.emit(ClientEvent::ServerError {
                    code: server_error.code,
                    message: server_error.message,
                });
            }
            Inbound::ConnectionEstablished(_) => {
                debug!("Ignoring connection_established after handshake");
            }
            Inbound::Event(envelope) => shared.route(envelope).await,
        }
    }

    debug!("Listen loop exiting");
}

/// Report why reading stopped, unless `close()` caused it
async fn terminate(shared: &Shared, cause: PusherError) {
    if shared.stopped() {
        debug!("Listen loop ended by close: {}", cause);
        return;
    }

    let text = cause.to_string();
    error!("Listen loop failed: {}", text);
    shared.route(Envelope::new(ERR_EVENT, text.clone())).await;
    shared.emit(ClientEvent::ListenerFailed(text));
}
