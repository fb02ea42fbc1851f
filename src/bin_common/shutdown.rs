//! Ctrl+C handling for the feed binaries
//!
//! The flag is read from three places: the reconnect loop in `main`, the
//! blocking consumer thread of the current session, and the pause between
//! sessions. All of them poll, so a plain atomic is enough.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::{sleep, Instant};
use tracing::info;

/// How often a reconnect pause looks at the flag
const PAUSE_POLL: Duration = Duration::from_millis(50);

/// Running flag shared by the session loop and its consumers
///
/// Clones share one flag; once stopped it never restarts.
#[derive(Debug, Clone)]
pub struct ShutdownManager {
    running: Arc<AtomicBool>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Stop on the first Ctrl+C
    pub fn spawn_signal_handler(&self) {
        let stopper = self.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, finishing the current session");
                stopper.trigger();
            }
        });
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn trigger(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Wait out the pause before the next session
    ///
    /// Returns `true` when the full delay elapsed and a new session should be
    /// opened, `false` when shutdown was requested in the meantime.
    pub async fn reconnect_pause(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            sleep(PAUSE_POLL.min(deadline - now)).await;
        }
        false
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
