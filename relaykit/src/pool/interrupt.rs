use std::sync::{Arc, Mutex, PoisonError};

use flume::{Receiver, Sender, TryRecvError};

/// One-shot cancellation latch for a thread blocked in
/// [`NamedTaskPool::submit_all_and_await_with`](super::NamedTaskPool::submit_all_and_await_with).
///
/// Clones share the latch. Triggering drops the only sender, so every
/// receiver observes a disconnect from then on.
#[derive(Debug, Clone)]
pub struct Interrupt {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        let (tx, rx) = flume::bounded(1);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    /// Fires the latch. Later calls do nothing.
    pub fn trigger(&self) {
        self.trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}
