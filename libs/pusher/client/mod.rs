//! Pusher connection
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!  subscribe ───> │                              │
//!  unsubscribe ─> │   send lock (FrameSink)      │ ──> broker
//!  heartbeat ───> │                              │
//!  pong ────────> └──────────────────────────────┘
//!
//!  broker ──> FrameStream ──> listen loop ──> dispatch table ──> bound queues
//!                                  │
//!                                  └──> diagnostics (ClientEvent)
//! ```
//!
//! Two background tasks per connection: the listen loop owns the stream,
//! the heartbeat loop pings on an interval. The subscription registry and the
//! dispatch table have independent locks and neither is held across an await.
//!
//! `close()` is the only way to stop a connection. It flips the state to
//! `Stopped` and fires the shutdown signal, which wakes both loops and
//! abandons any in-flight send. It then closes the sink and waits for both
//! tasks.

mod handshake;
mod heartbeat;
mod listen;
pub mod state;

pub use state::{ClientEvent, ConnectionState, Metrics};

use crate::config::ClientConfig;
use crate::dispatch::{Delivery, DispatchTable, EventQueue};
use crate::error::{PusherError, Result};
use crate::protocol::{ControlFrame, Envelope};
use crate::registry::SubscriptionRegistry;
use crossbeam_channel::{unbounded, Receiver, Sender};
use hypersockets::{
    wait_closed, CloseSignal, ConnectOptions, FrameSink, FrameStream, HyperSocketError,
};
use state::{AtomicConnectionState, AtomicMetrics};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Upper bound on waiting for the send lock while closing
const CLOSE_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// State shared between the client handle and its background tasks
pub(crate) struct Shared {
    sink: tokio::sync::Mutex<Box<dyn FrameSink>>,
    state: AtomicConnectionState,
    metrics: AtomicMetrics,
    registry: SubscriptionRegistry,
    dispatch: DispatchTable,
    config: ClientConfig,
    events: Sender<ClientEvent>,
    shutdown: CloseSignal,
}

impl Shared {
    #[inline]
    fn stopped(&self) -> bool {
        self.state.is_stopped()
    }

    /// Serialize and send one control frame under the send lock
    ///
    /// Refused once the connection is stopped. Waiting for the lock and the
    /// send itself are both abandoned when the shutdown signal fires, so a
    /// stalled write never holds the lock against `close()`.
    async fn send_frame(&self, frame: ControlFrame) -> Result<()> {
        let message = frame.to_message()?;
        let mut shutdown = self.shutdown.watcher();

        let send = async {
            let mut sink = self.sink.lock().await;
            if self.stopped() {
                return Err(PusherError::Stopped);
            }
            sink.send(message).await.map_err(PusherError::from)
        };

        tokio::select! {
            biased;
            _ = wait_closed(&mut shutdown) => return Err(PusherError::Stopped),
            result = send => result?,
        }

        self.metrics.increment_sent();
        debug!("Sent {}", frame.event());
        Ok(())
    }

    /// Hand an envelope to the dispatch table and account for the outcome
    async fn route(&self, envelope: Envelope) {
        let event = envelope.event.clone();
        match self.dispatch.deliver(envelope, || self.stopped()).await {
            Delivery::Delivered => self.metrics.increment_delivered(),
            Delivery::Evicted => {
                self.metrics.increment_delivered();
                self.metrics.increment_dropped();
                warn!("Queue for {} full, evicted oldest event", event);
            }
            Delivery::Dropped => {
                self.metrics.increment_dropped();
                warn!("Queue for {} full, dropping event", event);
            }
            Delivery::Unbound => {
                self.metrics.increment_unbound();
                debug!("No binder for {}, discarding", event);
            }
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

/// Client for one Pusher connection
///
/// Obtained from one of the `connect` constructors, which only return once
/// the broker has confirmed the connection. Every method takes `&self`, so
/// the client can be shared behind an `Arc`.
pub struct PusherClient {
    shared: Arc<Shared>,
    socket_id: Option<String>,
    activity_timeout: Option<u64>,
    event_rx: Receiver<ClientEvent>,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl PusherClient {
    /// Connect to the default broker (`wss://ws.pusherapp.com:443`)
    pub async fn connect(app_key: &str) -> Result<Self> {
        Self::connect_with_config(app_key, ClientConfig::default()).await
    }

    /// Connect to a custom broker with default tuning
    pub async fn connect_custom(app_key: &str, host: &str, scheme: &str) -> Result<Self> {
        Self::connect_with_config(app_key, ClientConfig::custom(host, scheme)).await
    }

    pub async fn connect_with_config(app_key: &str, config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let url = config.endpoint(app_key);
        info!("Connecting to {}", url);
        let options = ConnectOptions::new(url)
            .max_message_size(config.max_message_size)
            .connect_timeout(config.handshake_timeout());
        let (sink, stream) = hypersockets::connect(&options).await?;

        Self::connect_with_transport(app_key, config, sink, stream).await
    }

    /// Run the handshake over an already open transport
    ///
    /// On failure the transport is closed and no task is started.
    pub async fn connect_with_transport<K, S>(
        app_key: &str,
        config: ClientConfig,
        sink: K,
        stream: S,
    ) -> Result<Self>
    where
        K: FrameSink + 'static,
        S: FrameStream + 'static,
    {
        config.validate()?;

        let mut sink: Box<dyn FrameSink> = Box::new(sink);
        let mut stream: Box<dyn FrameStream> = Box::new(stream);

        let success = match handshake::perform(&mut *stream, &config).await {
            Ok(success) => success,
            Err(e) => {
                warn!("Handshake failed for app {}: {}", app_key, e);
                let _ = sink.close().await;
                return Err(e);
            }
        };
        info!(
            "Connected to app {} (socket_id: {:?})",
            app_key, success.socket_id
        );

        let (event_tx, event_rx) = unbounded();
        let dispatch = DispatchTable::new(config.event_buffer_size, config.overflow_policy);
        let shared = Arc::new(Shared {
            sink: tokio::sync::Mutex::new(sink),
            state: AtomicConnectionState::new(ConnectionState::Connecting),
            metrics: AtomicMetrics::new(),
            registry: SubscriptionRegistry::new(),
            dispatch,
            config,
            events: event_tx,
            shutdown: CloseSignal::new(),
        });
        shared.state.establish();
        shared.emit(ClientEvent::Connected {
            socket_id: success.socket_id.clone(),
        });

        let listen = tokio::spawn(listen::listen_loop(Arc::clone(&shared), stream));
        let heartbeat = tokio::spawn(heartbeat::heartbeat_loop(Arc::clone(&shared)));

        Ok(Self {
            shared,
            socket_id: success.socket_id,
            activity_timeout: success.activity_timeout,
            event_rx,
            tasks: parking_lot::Mutex::new(vec![listen, heartbeat]),
        })
    }

    /// Subscribe to a channel
    ///
    /// The channel is recorded before the frame goes out and forgotten again
    /// if the send fails, so a concurrent duplicate is rejected and only one
    /// subscribe frame is ever sent.
    pub async fn subscribe(&self, channel: &str) -> Result<()> {
        if self.stopped() {
            return Err(PusherError::Stopped);
        }
        self.shared.registry.add(channel)?;

        let frame = ControlFrame::Subscribe(channel.to_string());
        if let Err(e) = self.shared.send_frame(frame).await {
            self.shared.registry.remove(channel);
            warn!("Subscribe to {} failed: {}", channel, e);
            return Err(e);
        }

        info!("Subscribed to {}", channel);
        self.shared.emit(ClientEvent::Subscribed(channel.to_string()));
        Ok(())
    }

    /// Unsubscribe from a channel
    ///
    /// The channel stays recorded if the frame cannot be sent.
    pub async fn unsubscribe(&self, channel: &str) -> Result<()> {
        if self.stopped() {
            return Err(PusherError::Stopped);
        }
        if !self.shared.registry.remove(channel) {
            return Err(PusherError::NotSubscribed(channel.to_string()));
        }

        let frame = ControlFrame::Unsubscribe(channel.to_string());
        if let Err(e) = self.shared.send_frame(frame).await {
            warn!("Unsubscribe from {} failed: {}", channel, e);
            if let Err(conflict) = self.shared.registry.add(channel) {
                debug!("Not restoring {}: {}", channel, conflict);
            }
            return Err(e);
        }

        info!("Unsubscribed from {}", channel);
        self.shared.emit(ClientEvent::Unsubscribed(channel.to_string()));
        Ok(())
    }

    /// Register a queue for an event name
    ///
    /// Bind [`ERR_EVENT`](crate::protocol::ERR_EVENT) to be told when the
    /// listen loop dies on a transport failure.
    ///
    /// The binding outlives the returned queue; call [`unbind`](Self::unbind)
    /// to release it.
    pub fn bind(&self, event: &str) -> Result<EventQueue> {
        self.shared.dispatch.bind(event)
    }

    /// Drop the queue bound to an event name; returns whether one existed
    pub fn unbind(&self, event: &str) -> bool {
        self.shared.dispatch.unbind(event)
    }

    #[inline]
    pub fn stopped(&self) -> bool {
        self.shared.stopped()
    }

    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.shared.state.get()
    }

    /// Stop the connection and wait for the background tasks
    ///
    /// Calls after the first return `Ok(())` without touching the transport.
    pub async fn close(&self) -> Result<()> {
        if !self.shared.state.stop() {
            debug!("Close called on a stopped connection");
            return Ok(());
        }
        info!("Closing Pusher connection");

        self.shared.shutdown.close();
        let result = match tokio::time::timeout(CLOSE_LOCK_TIMEOUT, self.shared.sink.lock()).await
        {
            Ok(mut sink) => sink.close().await,
            Err(_) => {
                warn!("Send lock still held after {:?}, leaving sink open", CLOSE_LOCK_TIMEOUT);
                Err(HyperSocketError::Timeout(
                    "waiting for the send lock during close".to_string(),
                ))
            }
        };

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        debug!("Waiting for {} background tasks", handles.len());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Background task ended abnormally: {}", e);
            }
        }

        self.shared.emit(ClientEvent::Closed);
        info!("Pusher connection closed");
        result.map_err(PusherError::from)
    }

    /// Socket id assigned by the broker, if it sent one
    pub fn socket_id(&self) -> Option<&str> {
        self.socket_id.as_deref()
    }

    /// Broker's advertised inactivity timeout in seconds, if it sent one
    pub fn activity_timeout(&self) -> Option<u64> {
        self.activity_timeout
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub fn subscribed_channels(&self) -> Vec<String> {
        self.shared.registry.channels()
    }

    pub fn bound_events(&self) -> Vec<String> {
        self.shared.dispatch.bound_events()
    }

    pub fn metrics(&self) -> Metrics {
        self.shared.metrics.snapshot(self.state())
    }

    /// Try to receive a diagnostic event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive a diagnostic event (blocking)
    pub fn recv_event(&self) -> std::result::Result<ClientEvent, crossbeam_channel::RecvError> {
        self.event_rx.recv()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for PusherClient {
    fn drop(&mut self) {
        if self.shared.state.stop() {
            debug!("Client dropped without close, aborting background tasks");
            self.shared.shutdown.close();
            for handle in self.tasks.get_mut().drain(..) {
                handle.abort();
            }
        }
    }
}
