//! Close signal shared by the two halves of a connection
//!
//! The sink owns the right to close; the stream watches the signal so that a
//! read parked on the socket returns as soon as the sink is closed.

use std::sync::Arc;
use tokio::sync::watch;

/// One-shot, idempotent close flag with async notification
#[derive(Debug, Clone)]
pub struct CloseSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal
    ///
    /// Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.tx.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        })
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver to await the signal with [`wait_closed`]
    pub fn watcher(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once the watched signal has fired
pub async fn wait_closed(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            // Every sender is gone; nothing can reopen the connection.
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_close_is_idempotent() {
        let signal = CloseSignal::new();
        assert!(!signal.is_closed());
        assert!(signal.close());
        assert!(!signal.close());
        assert!(signal.is_closed());
    }

    #[tokio::test]
    async fn test_wait_closed_wakes_pending_waiter() {
        let signal = CloseSignal::new();
        let mut watcher = signal.watcher();

        let waiter = tokio::spawn(async move {
            wait_closed(&mut watcher).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        signal.close();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake after close")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_closed_returns_immediately_when_already_closed() {
        let signal = CloseSignal::new();
        signal.close();
        let mut watcher = signal.watcher();
        tokio::time::timeout(Duration::from_millis(100), wait_closed(&mut watcher))
            .await
            .expect("already-closed signal should not block");
    }
}
