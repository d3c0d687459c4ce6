use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use relaykit_api::errors::HubError;
use relaykit_api::transport::{StreamRequest, StreamResponse};
use relaykit_api::types::{status, ChannelId};

use super::subscribers::{SubscriberSet, Unsubscriber};
use crate::config::HubConfig;
use crate::log_hub;

/// Headers that stop intermediaries from caching a streaming response.
pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-cache, must-revalidate, post-check=0, pre-check=0"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

/// Registry of held-open streaming responses.
///
/// Turns incoming requests into subscriber channels; what gets written to
/// them is up to the owner (see [`TextStreamHub`](super::TextStreamHub)).
#[derive(Debug)]
pub struct StreamHub {
    config: HubConfig,
    subscribers: Arc<SubscriberSet>,
    closed: AtomicBool,
}

impl StreamHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            subscribers: Arc::new(SubscriberSet::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub(crate) fn subscriber_set(&self) -> &Arc<SubscriberSet> {
        &self.subscribers
    }

    /// Accepts a new subscriber.
    ///
    /// Commits a `200` response with the configured content type and no-cache
    /// headers, switches the exchange to async mode and adds the channel to
    /// the subscriber set. The channel leaves the set when the transport
    /// completes it, times it out or reports an error.
    ///
    /// # Errors
    /// - [`HubError::AsyncNotSupported`] after answering `501`
    /// - [`HubError::ShutDown`] after answering `503`
    /// - [`HubError::Transport`] if committing the response or starting
    ///   async mode fails
    pub fn on_connect(
        &self,
        request: &mut dyn StreamRequest,
        response: &mut dyn StreamResponse,
    ) -> Result<ChannelId, HubError> {
        let span = crate::hub_span!("connect");
        let _entered = span.enter();

        if !request.is_async_supported() {
            let err = HubError::AsyncNotSupported;
            if let Err(io_err) = response.send_error(status::NOT_IMPLEMENTED, &err.to_string()) {
                warn!(error = %io_err, "failed to send 501 response");
            }
            return Err(err);
        }

        if self.is_shut_down() {
            let err = HubError::ShutDown;
            if let Err(io_err) = response.send_error(status::SERVICE_UNAVAILABLE, &err.to_string())
            {
                warn!(error = %io_err, "failed to send 503 response");
            }
            return Err(err);
        }

        response.set_content_type(&self.config.content_type);
        if let Some(encoding) = &self.config.character_encoding {
            response.set_character_encoding(encoding);
        }
        response.set_status(status::OK);
        for (name, value) in NO_CACHE_HEADERS {
            response.set_header(name, value);
        }
        response.flush_buffer()?;

        let channel = request.start_async()?;
        channel.set_timeout(self.config.async_timeout());

        let id = ChannelId::new();
        if let Err(existing) = self.subscribers.insert(id, Arc::clone(&channel)) {
            debug!(channel = %existing, "channel already subscribed");
            return Ok(existing);
        }
        channel.add_listener(Arc::new(Unsubscriber::new(id, &self.subscribers)));

        // Lost a race with on_shutdown
        if self.is_shut_down() {
            self.subscribers.remove(&id);
            return Err(HubError::ShutDown);
        }

        log_hub!(id, "subscribed", subscribers = self.subscribers.len());
        Ok(id)
    }

    /// Closes the hub to new subscribers and forgets the current ones
    /// without completing their responses.
    pub fn on_shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let dropped = self.subscribers.clear();
            info!(dropped, "stream hub shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Removes a channel. The response itself is left open.
    pub fn unsubscribe(&self, id: &ChannelId) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            log_hub!(id, "unsubscribed", reason = "manual");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn subscribers(&self) -> Vec<ChannelId> {
        self.subscribers.ids()
    }

    pub fn is_subscribed(&self, id: &ChannelId) -> bool {
        self.subscribers.contains(id)
    }
}
