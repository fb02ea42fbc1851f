use super::events;
use crate::error::{PusherError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Only the `event` field of a frame
#[derive(Debug, Clone, Deserialize)]
pub struct EventStub {
    pub event: String,
}

/// A named event pushed by the broker
///
/// `data` is the opaque payload as text. Brokers normally send it as a JSON
/// string; any other JSON value is kept as its compact JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default, deserialize_with = "opaque_data")]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// Error reported by the broker, during the handshake or later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub code: i64,
    pub message: String,
}

/// Payload of `pusher:connection_established`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeSuccess {
    pub socket_id: Option<String>,
    pub activity_timeout: Option<u64>,
}

/// A fully decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    ConnectionEstablished(HandshakeSuccess),
    Error(ErrorEvent),
    Ping,
    Pong,
    Event(Envelope),
}

impl Inbound {
    /// Wire name of the decoded frame
    pub fn event_name(&self) -> &str {
        match self {
            Inbound::ConnectionEstablished(_) => events::CONNECTION_ESTABLISHED,
            Inbound::Error(_) => events::ERROR,
            Inbound::Ping => events::PING,
            Inbound::Pong => events::PONG,
            Inbound::Event(envelope) => &envelope.event,
        }
    }
}

/// Frame with an arbitrary `data` value, used for the protocol events
#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct ErrorData {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Deserialize)]
struct ConnectionData {
    socket_id: Option<String>,
    activity_timeout: Option<u64>,
}

/// Decode one inbound frame
pub fn decode(text: &str) -> Result<Inbound> {
    let stub: EventStub = serde_json::from_str(text)
        .map_err(|e| PusherError::Decode(format!("invalid frame: {}", e)))?;

    match stub.event.as_str() {
        events::CONNECTION_ESTABLISHED => {
            Ok(Inbound::ConnectionEstablished(decode_connection(text)))
        }
        events::ERROR => decode_error(text).map(Inbound::Error),
        events::PING => Ok(Inbound::Ping),
        events::PONG => Ok(Inbound::Pong),
        _ => serde_json::from_str::<Envelope>(text)
            .map(Inbound::Event)
            .map_err(|e| PusherError::Decode(format!("invalid {} event: {}", stub.event, e))),
    }
}

fn decode_error(text: &str) -> Result<ErrorEvent> {
    let raw: RawFrame = serde_json::from_str(text)
        .map_err(|e| PusherError::Decode(format!("invalid error frame: {}", e)))?;
    let data: ErrorData = nested_data(raw.data)
        .map_err(|e| PusherError::Decode(format!("invalid error data: {}", e)))?;

    Ok(ErrorEvent {
        code: data.code.unwrap_or_default(),
        message: data.message,
    })
}

/// Socket details are informational; anything unreadable yields `None`s
fn decode_connection(text: &str) -> HandshakeSuccess {
    serde_json::from_str::<RawFrame>(text)
        .ok()
        .and_then(|raw| nested_data::<ConnectionData>(raw.data).ok())
        .map(|data| HandshakeSuccess {
            socket_id: data.socket_id,
            activity_timeout: data.activity_timeout,
        })
        .unwrap_or_default()
}

/// Protocol payloads arrive either as an object or as a string holding one
fn nested_data<T: for<'de> Deserialize<'de>>(data: Value) -> serde_json::Result<T> {
    match data {
        Value::String(inner) => serde_json::from_str(&inner),
        other => serde_json::from_value(other),
    }
}

fn opaque_data<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
