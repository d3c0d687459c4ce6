use std::collections::HashMap;
use std::io;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::warn;

use relaykit_api::transport::AsyncListener;
use relaykit_api::types::{ChannelId, SharedChannel};

use crate::log_hub;

/// Concurrent set of subscriber channels.
///
/// Iteration goes through [`snapshot`](Self::snapshot), so channels may join
/// or leave while a broadcast is in progress.
#[derive(Default)]
pub struct SubscriberSet {
    channels: RwLock<HashMap<ChannelId, SharedChannel>>,
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("len", &self.len())
            .finish()
    }
}

fn same_channel(a: &SharedChannel, b: &SharedChannel) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

fn find(channels: &HashMap<ChannelId, SharedChannel>, channel: &SharedChannel) -> Option<ChannelId> {
    channels
        .iter()
        .find(|(_, existing)| same_channel(existing, channel))
        .map(|(id, _)| *id)
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ChannelId, SharedChannel>> {
        self.channels.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ChannelId, SharedChannel>> {
        self.channels.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `channel` under `id`. If the same channel is already present the
    /// set is left unchanged and the id it is registered under is returned.
    pub fn insert(&self, id: ChannelId, channel: SharedChannel) -> Result<(), ChannelId> {
        let mut channels = self.write();
        if let Some(existing) = find(&channels, &channel) {
            return Err(existing);
        }
        channels.insert(id, channel);
        Ok(())
    }

    pub fn remove(&self, id: &ChannelId) -> Option<SharedChannel> {
        self.write().remove(id)
    }

    /// Removes every channel without completing it. Returns how many there
    /// were.
    pub fn clear(&self) -> usize {
        let mut channels = self.write();
        let count = channels.len();
        channels.clear();
        count
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.read().contains_key(id)
    }

    pub fn ids(&self) -> Vec<ChannelId> {
        self.read().keys().copied().collect()
    }

    pub fn snapshot(&self) -> Vec<(ChannelId, SharedChannel)> {
        self.read()
            .iter()
            .map(|(id, channel)| (*id, Arc::clone(channel)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Drops a channel from its set once the transport ends the exchange.
pub(crate) struct Unsubscriber {
    id: ChannelId,
    subscribers: Weak<SubscriberSet>,
}

impl Unsubscriber {
    pub(crate) fn new(id: ChannelId, subscribers: &Arc<SubscriberSet>) -> Self {
        Self {
            id,
            subscribers: Arc::downgrade(subscribers),
        }
    }

    fn unsubscribe(&self, reason: &'static str) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            if subscribers.remove(&self.id).is_some() {
                log_hub!(self.id, "unsubscribed", reason = reason);
            }
        }
    }
}

impl AsyncListener for Unsubscriber {
    fn on_complete(&self) {
        self.unsubscribe("complete");
    }

    fn on_timeout(&self) {
        self.unsubscribe("timeout");
    }

    fn on_error(&self, error: &io::Error) {
        warn!(channel = %self.id, error = %error, "subscriber channel failed");
        self.unsubscribe("error");
    }
}
