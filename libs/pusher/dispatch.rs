//! Event dispatch table
//!
//! Maps an event name to the bounded queue its binder drains:
//!
//! ```text
//! listen loop ──> deliver(envelope) ──> table[envelope.event] ──> queue ──> caller
//!                                            │
//!                                            └─ no binder: discarded
//! ```
//!
//! Non-blocking queue operations happen under the table lock, so a delivery
//! never lands in a queue that was unbound before it. Under
//! [`OverflowPolicy::Block`] the wait for room happens with the lock released.

use crate::config::OverflowPolicy;
use crate::error::{PusherError, Result};
use crate::protocol::Envelope;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Read handle returned by `bind`
pub type EventQueue = Receiver<Envelope>;

/// Pause between attempts while waiting for room under `Block`
const BLOCK_RETRY_INTERVAL: Duration = Duration::from_millis(5);

/// Registered queue for one event name
///
/// The table keeps its own receiver so it can evict the oldest entry and
/// discard pending entries on unbind.
#[derive(Debug, Clone)]
pub struct Binder {
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
}

impl Binder {
    /// Envelopes waiting in the queue
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tx.is_full()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.tx.capacity()
    }
}

/// Outcome of one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued
    Delivered,
    /// Queued after evicting the oldest pending envelope
    Evicted,
    /// Queue full, envelope discarded
    Dropped,
    /// No binder for the event name, envelope discarded
    Unbound,
}

enum Attempt {
    Done(Delivery),
    Full(Envelope),
}

/// Event name to delivery queue
#[derive(Debug)]
pub struct DispatchTable {
    binders: Mutex<HashMap<String, Binder>>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl DispatchTable {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            binders: Mutex::new(HashMap::new()),
            capacity,
            policy,
        }
    }

    /// Register a fresh queue for `event`; the first binder wins
    ///
    /// Dropping the returned queue does not release the binding: envelopes
    /// keep arriving (up to the queue capacity) until [`unbind`](Self::unbind)
    /// is called.
    pub fn bind(&self, event: &str) -> Result<EventQueue> {
        let mut binders = self.binders.lock();
        if binders.contains_key(event) {
            return Err(PusherError::AlreadyBound(event.to_string()));
        }

        let (tx, rx) = bounded(self.capacity);
        binders.insert(
            event.to_string(),
            Binder {
                tx,
                rx: rx.clone(),
            },
        );
        debug!("Bound event {}", event);
        Ok(rx)
    }

    /// Deregister `event`, discarding what its queue still holds
    ///
    /// Returns whether a binder existed.
    pub fn unbind(&self, event: &str) -> bool {
        let removed = self.binders.lock().remove(event);
        match removed {
            Some(binder) => {
                let mut discarded = 0usize;
                while binder.rx.try_recv().is_ok() {
                    discarded += 1;
                }
                debug!("Unbound event {} ({} pending discarded)", event, discarded);
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, event: &str) -> Option<Binder> {
        self.binders.lock().get(event).cloned()
    }

    /// Sorted snapshot of the bound event names
    pub fn bound_events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.binders.lock().keys().cloned().collect();
        events.sort();
        events
    }

    /// Route an envelope to the binder of its event name
    ///
    /// Under `Block` this waits for room until `stopped()` turns true or the
    /// event is unbound.
    pub async fn deliver<F>(&self, envelope: Envelope, stopped: F) -> Delivery
    where
        F: Fn() -> bool,
    {
        let mut envelope = envelope;
        loop {
            match self.try_deliver(envelope) {
                Attempt::Done(delivery) => return delivery,
                Attempt::Full(pending) => {
                    if stopped() {
                        return Delivery::Dropped;
                    }
                    envelope = pending;
                    tokio::time::sleep(BLOCK_RETRY_INTERVAL).await;
                }
            }
        }
    }

    fn try_deliver(&self, envelope: Envelope) -> Attempt {
        let binders = self.binders.lock();
        let binder = match binders.get(&envelope.event) {
            Some(binder) => binder,
            None => return Attempt::Done(Delivery::Unbound),
        };

        match binder.tx.try_send(envelope) {
            Ok(()) => Attempt::Done(Delivery::Delivered),
            Err(TrySendError::Full(envelope)) => match self.policy {
                OverflowPolicy::DropNewest => Attempt::Done(Delivery::Dropped),
                OverflowPolicy::DropOldest => {
                    let _ = binder.rx.try_recv();
                    match binder.tx.try_send(envelope) {
                        Ok(()) => Attempt::Done(Delivery::Evicted),
                        Err(_) => Attempt::Done(Delivery::Dropped),
                    }
                }
                OverflowPolicy::Block => Attempt::Full(envelope),
            },
            // The table holds a receiver for as long as the event is bound
            Err(TrySendError::Disconnected(_)) => Attempt::Done(Delivery::Unbound),
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_for_test(&self) -> parking_lot::MutexGuard<'_, HashMap<String, Binder>> {
        self.binders.lock()
    }
}
