use super::events;
use crate::error::{PusherError, Result};
use hypersockets::WsMessage;
use serde::Serialize;

/// Outbound protocol-management frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    Subscribe(String),
    Unsubscribe(String),
    Ping,
    Pong,
}

/// Field order is the wire order: `event` first, then `data`
#[derive(Serialize)]
struct OutboundFrame<'a> {
    event: &'a str,
    data: FrameData<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum FrameData<'a> {
    Channel { channel: &'a str },
    Text(&'a str),
}

/// Ping and pong carry an empty JSON object encoded as a string
const EMPTY_DATA: &str = "{}";

impl ControlFrame {
    pub fn event(&self) -> &'static str {
        match self {
            ControlFrame::Subscribe(_) => events::SUBSCRIBE,
            ControlFrame::Unsubscribe(_) => events::UNSUBSCRIBE,
            ControlFrame::Ping => events::PING,
            ControlFrame::Pong => events::PONG,
        }
    }

    /// Serialize to the exact wire text
    pub fn encode(&self) -> Result<String> {
        let data = match self {
            ControlFrame::Subscribe(channel) | ControlFrame::Unsubscribe(channel) => {
                FrameData::Channel { channel }
            }
            ControlFrame::Ping | ControlFrame::Pong => FrameData::Text(EMPTY_DATA),
        };
        serde_json::to_string(&OutboundFrame {
            event: self.event(),
            data,
        })
        .map_err(|e| PusherError::Encode(e.to_string()))
    }

    pub fn to_message(&self) -> Result<WsMessage> {
        self.encode().map(WsMessage::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_frames_are_bit_exact() {
        assert_eq!(
            ControlFrame::Subscribe("live_trades".to_string()).encode().unwrap(),
            r#"{"event":"pusher:subscribe","data":{"channel":"live_trades"}}"#
        );
        assert_eq!(
            ControlFrame::Unsubscribe("order_book".to_string()).encode().unwrap(),
            r#"{"event":"pusher:unsubscribe","data":{"channel":"order_book"}}"#
        );
        assert_eq!(
            ControlFrame::Ping.encode().unwrap(),
            r#"{"event":"pusher:ping","data":"{}"}"#
        );
        assert_eq!(
            ControlFrame::Pong.encode().unwrap(),
            r#"{"event":"pusher:pong","data":"{}"}"#
        );
    }

    #[test]
    fn test_channel_names_are_escaped() {
        let text = ControlFrame::Subscribe(r#"we"ird"#.to_string()).encode().unwrap();
        assert_eq!(text, r#"{"event":"pusher:subscribe","data":{"channel":"we\"ird"}}"#);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["data"]["channel"], r#"we"ird"#);
    }

    #[test]
    fn test_to_message_is_text() {
        let message = ControlFrame::Ping.to_message().unwrap();
        assert_eq!(message.as_text(), Some(r#"{"event":"pusher:ping","data":"{}"}"#));
    }
}
