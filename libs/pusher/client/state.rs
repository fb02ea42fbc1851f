//! Lock-free connection state, counters and diagnostics

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Lifecycle of one connection
///
/// `Connecting` while the handshake is in flight, `Established` once the
/// broker confirmed it, `Stopped` after `close()`. A listen loop that died
/// on a read failure leaves the state alone. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Established = 1,
    Stopped = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Established,
            _ => ConnectionState::Stopped,
        }
    }
}

#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `Established` unless already stopped
    pub fn establish(&self) -> bool {
        self.transition(ConnectionState::Connecting, ConnectionState::Established)
    }

    /// Move to `Stopped`; only the first caller gets `true`
    pub fn stop(&self) -> bool {
        self.0.swap(ConnectionState::Stopped as u8, Ordering::AcqRel)
            != ConnectionState::Stopped as u8
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.get() == ConnectionState::Stopped
    }

    fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[derive(Debug, Default)]
pub struct AtomicMetrics {
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    events_delivered: AtomicU64,
    events_dropped: AtomicU64,
    events_unbound: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_unbound(&self) {
        self.events_unbound.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, state: ConnectionState) -> Metrics {
        Metrics {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_unbound: self.events_unbound.load(Ordering::Relaxed),
            connection_state: state,
        }
    }
}

/// Client metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    pub frames_sent: u64,
    pub frames_received: u64,
    /// Envelopes handed to a bound queue
    pub events_delivered: u64,
    /// Envelopes lost to a full queue, evictions included
    pub events_dropped: u64,
    /// Envelopes nobody was bound to
    pub events_unbound: u64,
    pub connection_state: ConnectionState,
}

/// Diagnostic events emitted by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Handshake confirmed
    Connected { socket_id: Option<String> },
    Subscribed(String),
    Unsubscribed(String),
    /// `pusher:error` received after the handshake
    ServerError { code: i64, message: String },
    /// The listen loop stopped on a read or decode failure
    ListenerFailed(String),
    /// A heartbeat ping could not be sent
    HeartbeatFailed(String),
    /// The connection reached `Stopped`
    Closed,
}
