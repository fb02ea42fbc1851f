//! Heartbeat loop
//!
//! ```text
//! ┌─────────────────────┐
//! │  Heartbeat Task     │
//! │                     │
//! │  1. Send ping ──────┼──> send lock ──> FrameSink
//! │  2. Wait interval   │
//! │     or shutdown     │
//! │  3. Repeat          │
//! └─────────────────────┘
//! ```
//!
//! A failed ping is reported and the loop carries on; only `close()` ends it.

use super::{ClientEvent, Shared};
use crate::error::PusherError;
use crate::protocol::ControlFrame;
use hypersockets::wait_closed;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub(crate) async fn heartbeat_loop(shared: Arc<Shared>) {
    let interval = shared.config.heartbeat_interval();
    // First tick completes immediately, so the first ping goes out right away
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut shutdown = shared.shutdown.watcher();

    debug!("Heartbeat task started with interval: {:?}", interval);

    loop {
        if shared.stopped() {
            break;
        }

        tokio::select! {
            biased;
            _ = wait_closed(&mut shutdown) => break,
            _ = ticker.tick() => {}
        }

        match shared.send_frame(ControlFrame::Ping).await {
            Ok(()) => debug!("Heartbeat ping sent"),
            Err(PusherError::Stopped) => break,
            Err(e) => {
                warn!("Heartbeat ping failed: {}", e);
                shared.emit(ClientEvent::HeartbeatFailed(e.to_string()));
            }
        }
    }

    debug!("Heartbeat task exiting");
}
