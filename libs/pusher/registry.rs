//! Subscribed channel bookkeeping

use crate::error::{PusherError, Result};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Set of channel names the connection is subscribed to
///
/// One mutex serializes every operation; the set stays small.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    channels: Mutex<HashSet<String>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.lock().contains(channel)
    }

    /// Record a channel; fails if it is already recorded
    pub fn add(&self, channel: &str) -> Result<()> {
        if self.channels.lock().insert(channel.to_string()) {
            Ok(())
        } else {
            Err(PusherError::AlreadySubscribed(channel.to_string()))
        }
    }

    /// Forget a channel; returns whether it was present
    pub fn remove(&self, channel: &str) -> bool {
        self.channels.lock().remove(channel)
    }

    /// Sorted snapshot of the recorded channels
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.channels.lock().iter().cloned().collect();
        channels.sort();
        channels
    }

    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn lock_for_test(&self) -> parking_lot::MutexGuard<'_, HashSet<String>> {
        self.channels.lock()
    }
}
