use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender, TryRecvError};
use tracing::{debug, info, warn};

use relaykit_api::errors::HubError;
use relaykit_api::transport::{StreamRequest, StreamResponse};
use relaykit_api::types::ChannelId;

use super::stream::StreamHub;
use crate::config::HubConfig;
use crate::pool::worker::panic_message;
use crate::{log_error, log_hub};

/// Counters and gauges of a [`TextStreamHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubMetrics {
    /// Channels currently subscribed
    pub subscribers: usize,

    /// Messages taken off the queue and broadcast
    pub messages_distributed: u64,

    /// Successful writes, one per message per subscriber
    pub frames_delivered: u64,

    /// Writes that failed and evicted their channel
    pub write_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    messages_distributed: AtomicU64,
    frames_delivered: AtomicU64,
    write_failures: AtomicU64,
}

/// Producer side of a [`TextStreamHub`] queue.
pub struct Publisher<M> {
    sender: Sender<M>,
}

impl<M> Clone for Publisher<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<M> fmt::Debug for Publisher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("queued", &self.sender.len())
            .field("closed", &self.sender.is_disconnected())
            .finish()
    }
}

impl<M: Send + 'static> Publisher<M> {
    /// Queues a message for broadcast. Never blocks.
    ///
    /// # Errors
    /// [`HubError::ShutDown`] once the distribution thread has stopped.
    pub fn publish(&self, message: M) -> Result<(), HubError> {
        self.sender.send(message).map_err(|_| HubError::ShutDown)
    }

    pub async fn publish_async(&self, message: M) -> Result<(), HubError> {
        self.sender
            .send_async(message)
            .await
            .map_err(|_| HubError::ShutDown)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_disconnected()
    }

    /// Messages waiting for the distribution thread.
    pub fn queued(&self) -> usize {
        self.sender.len()
    }
}

/// A [`StreamHub`] with one distribution thread that writes every queued
/// message, followed by the frame delimiter, to every subscriber.
///
/// ```rust,no_run
/// use relaykit::config::HubConfig;
/// use relaykit::hub::TextStreamHub;
///
/// let hub = TextStreamHub::<String>::start(HubConfig::default())?;
/// let publisher = hub.publisher().expect("hub owns its queue");
/// publisher.publish("tick".to_string())?;
///
/// // In the HTTP handler: hub.on_connect(&mut request, &mut response)?;
/// hub.on_shutdown();
/// # Ok::<(), relaykit::HubError>(())
/// ```
pub struct TextStreamHub<M> {
    hub: Arc<StreamHub>,
    publisher: Option<Publisher<M>>,
    stop: Mutex<Option<Sender<()>>>,
    distributor: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl<M> fmt::Debug for TextStreamHub<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStreamHub")
            .field("hub", &self.hub)
            .field("counters", &self.counters)
            .finish()
    }
}

enum Next<M> {
    Message(M),
    QueueClosed,
    Stop,
}

impl<M> TextStreamHub<M>
where
    M: Display + Send + 'static,
{
    /// Starts a hub with its own unbounded queue; use
    /// [`publisher`](Self::publisher) to feed it.
    pub fn start(config: HubConfig) -> Result<Self, HubError> {
        let (tx, rx) = flume::unbounded();
        let mut hub = Self::start_with_queue(config, rx)?;
        hub.publisher = Some(Publisher { sender: tx });
        Ok(hub)
    }

    /// Starts a hub that drains an externally owned queue.
    ///
    /// Once every sender of `events` is dropped the hub shuts itself down and
    /// later connects are refused with `503`.
    ///
    /// # Errors
    /// [`HubError::SpawnFailed`] if the configuration is invalid or the
    /// distribution thread cannot be spawned.
    pub fn start_with_queue(config: HubConfig, events: Receiver<M>) -> Result<Self, HubError> {
        config
            .validate()
            .map_err(|e| HubError::SpawnFailed(e.to_string()))?;

        let hub = Arc::new(StreamHub::new(config));
        let counters = Arc::new(Counters::default());
        let (stop_tx, stop_rx) = flume::bounded::<()>(1);

        let distribution = Distribution {
            events,
            stop: stop_rx,
            hub: Arc::clone(&hub),
            delimiter: hub.config().frame_delimiter.clone(),
            counters: Arc::clone(&counters),
        };

        let handle = thread::Builder::new()
            .name(hub.config().distribution_thread_name.clone())
            .spawn(move || distribution.run())
            .map_err(|e| HubError::SpawnFailed(e.to_string()))?;

        info!(
            thread = %hub.config().distribution_thread_name,
            "text stream hub started"
        );

        Ok(Self {
            hub,
            publisher: None,
            stop: Mutex::new(Some(stop_tx)),
            distributor: Mutex::new(Some(handle)),
            counters,
        })
    }
}

impl<M> TextStreamHub<M> {
    /// A producer for the hub's own queue; `None` when started with
    /// [`start_with_queue`](Self::start_with_queue).
    pub fn publisher(&self) -> Option<Publisher<M>> {
        self.publisher.clone()
    }

    pub fn hub(&self) -> &StreamHub {
        &self.hub
    }

    /// See [`StreamHub::on_connect`].
    pub fn on_connect(
        &self,
        request: &mut dyn StreamRequest,
        response: &mut dyn StreamResponse,
    ) -> Result<ChannelId, HubError> {
        self.hub.on_connect(request, response)
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    /// Closes the hub, stops the distribution thread and waits for it to
    /// exit. Messages still queued are dropped.
    pub fn on_shutdown(&self) {
        self.hub.on_shutdown();
        self.stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let handle = self
            .distributor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if let Err(payload) = handle.join() {
                log_error!(panic_message(payload.as_ref()), "distribution thread panicked");
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.hub.is_shut_down()
    }

    pub fn metrics(&self) -> HubMetrics {
        HubMetrics {
            subscribers: self.hub.subscriber_count(),
            messages_distributed: self.counters.messages_distributed.load(Ordering::Relaxed),
            frames_delivered: self.counters.frames_delivered.load(Ordering::Relaxed),
            write_failures: self.counters.write_failures.load(Ordering::Relaxed),
        }
    }
}

impl<M> Drop for TextStreamHub<M> {
    fn drop(&mut self) {
        self.on_shutdown();
    }
}

/// State owned by the distribution thread.
struct Distribution<M> {
    events: Receiver<M>,
    stop: Receiver<()>,
    hub: Arc<StreamHub>,
    delimiter: String,
    counters: Arc<Counters>,
}

impl<M: Display> Distribution<M> {
    fn run(self) {
        debug!("distribution loop started");
        loop {
            if matches!(self.stop.try_recv(), Err(TryRecvError::Disconnected)) {
                break;
            }

            let next = flume::Selector::new()
                .recv(&self.events, |event| match event {
                    Ok(message) => Next::Message(message),
                    Err(_) => Next::QueueClosed,
                })
                .recv(&self.stop, |_| Next::Stop)
                .wait();

            match next {
                Next::Message(message) => self.broadcast(&message),
                Next::QueueClosed => {
                    warn!("message queue closed, shutting the hub down");
                    self.hub.on_shutdown();
                    break;
                }
                Next::Stop => break,
            }
        }
        debug!("distribution loop stopped");
    }

    fn broadcast(&self, message: &M) {
        let frame = format!("{}{}", message, self.delimiter);

        let subscribers = self.hub.subscriber_set();
        for (id, channel) in subscribers.snapshot() {
            let written = channel.write_str(&frame).and_then(|_| channel.flush());
            match written {
                Ok(()) => {
                    self.counters.frames_delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    warn!(channel = %id, error = %err, "write failed, dropping subscriber");
                    self.counters.write_failures.fetch_add(1, Ordering::Relaxed);
                    subscribers.remove(&id);
                    channel.complete();
                    log_hub!(id, "unsubscribed", reason = "write failure");
                }
            }
        }

        self.counters
            .messages_distributed
            .fetch_add(1, Ordering::Relaxed);
    }
}
