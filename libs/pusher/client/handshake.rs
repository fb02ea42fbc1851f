use crate::config::ClientConfig;
use crate::error::{PusherError, Result};
use crate::protocol::{decode, HandshakeSuccess, Inbound};
use hypersockets::{FrameStream, HyperSocketError, WsMessage};
use tracing::debug;

/// Read the first frame and decide whether the broker accepted us
///
/// Exactly one frame is consumed. The caller closes the transport on error.
pub(crate) async fn perform<S>(stream: &mut S, config: &ClientConfig) -> Result<HandshakeSuccess>
where
    S: FrameStream + ?Sized,
{
    let timeout = config.handshake_timeout();
    let message = tokio::time::timeout(timeout, stream.recv())
        .await
        .map_err(|_| {
            HyperSocketError::Timeout(format!("no handshake frame within {:?}", timeout))
        })??;

    if message.len() > config.max_message_size {
        return Err(HyperSocketError::MessageTooLarge {
            size: message.len(),
            max: config.max_message_size,
        }
        .into());
    }

    let text = match message {
        WsMessage::Text(text) => text,
        WsMessage::Binary(data) => {
            return Err(PusherError::UnexpectedHandshake(format!(
                "binary frame of {} bytes",
                data.len()
            )))
        }
    };
    debug!("Handshake frame: {}", text);

    match decode(&text) {
        Ok(Inbound::ConnectionEstablished(success)) => Ok(success),
        Ok(Inbound::Error(error)) => Err(PusherError::Handshake {
            code: error.code,
            message: error.message,
        }),
        Ok(other) => Err(PusherError::UnexpectedHandshake(other.event_name().to_string())),
        Err(e) => Err(PusherError::UnexpectedHandshake(e.to_string())),
    }
}
