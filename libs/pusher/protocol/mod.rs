//! Pusher wire protocol
//!
//! Every frame is a JSON object whose `event` field names it. Inbound frames
//! are decoded in two phases: a stub decode reads only `event`, which picks
//! the concrete shape for the full decode.
//!
//! ```text
//! text ──> EventStub{event} ──┬─ pusher:connection_established ─> HandshakeSuccess
//!                             ├─ pusher:error ───────────────────> ErrorEvent
//!                             ├─ pusher:ping / pusher:pong ──────> control
//!                             └─ anything else ──────────────────> Envelope
//! ```

pub mod envelope;
pub mod frames;

pub use envelope::{decode, Envelope, ErrorEvent, EventStub, HandshakeSuccess, Inbound};
pub use frames::ControlFrame;

/// Protocol revision announced in the connection URL
pub const PROTOCOL_VERSION: &str = "7";

/// Default broker endpoint
pub const DEFAULT_HOST: &str = "ws.pusherapp.com:443";
pub const DEFAULT_SCHEME: &str = "wss";

/// Brokers cap a message at 10KB; the extra room covers the envelope
pub const MAX_MESSAGE_SIZE: usize = 11_000;

/// Reserved event name for transport failures seen by the listen loop
///
/// Binding this name receives a synthetic [`Envelope`] whose `data` is the
/// error text when the connection fails unexpectedly. It lives outside the
/// `pusher:`, `pusher_internal:` and `client-` namespaces so that no broker
/// event can collide with it.
pub const ERR_EVENT: &str = "pusher_client:transport_error";

/// Protocol event names
pub mod events {
    pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
    pub const ERROR: &str = "pusher:error";
    pub const PING: &str = "pusher:ping";
    pub const PONG: &str = "pusher:pong";
    pub const SUBSCRIBE: &str = "pusher:subscribe";
    pub const UNSUBSCRIBE: &str = "pusher:unsubscribe";
}

/// Build the connection endpoint `scheme://host/app/<key>?protocol=<version>`
pub fn endpoint(scheme: &str, host: &str, app_key: &str, protocol_version: &str) -> String {
    format!(
        "{}://{}/app/{}?protocol={}",
        scheme, host, app_key, protocol_version
    )
}
