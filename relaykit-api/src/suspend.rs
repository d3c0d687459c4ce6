//! # Cooperative Suspension
//!
//! A [`Suspender`] lets a running task park its own thread for a bounded
//! time while allowing any other thread to wake it early with
//! [`Suspender::skip`] or to cancel it with [`Suspender::interrupt`].
//!
//! ## State Machine
//!
//! ```text
//!            suspend()               skip()
//!   Idle ──────────────▶ Suspended ──────────▶ SkipRequested
//!    ▲                      │                        │
//!    │    deadline elapsed  │                        │ consumed by suspend()
//!    └──────────────────────┴────────────────────────┘
//! ```
//!
//! A skip that arrives while the task is `Idle` is handled according to the
//! [`SkipPolicy`]: `Persist` moves to `SkipRequested` so the next suspend
//! returns at once, `DiscardWhenIdle` drops it.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::errors::TaskError;

/// What happens to a skip request that arrives while nothing is suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Keep the request; the next `suspend` call consumes it and returns
    /// immediately.
    #[default]
    Persist,
    /// Drop the request. A skip racing with the start of a suspend call can
    /// be lost under this policy.
    DiscardWhenIdle,
}

/// Observable suspension state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendState {
    Idle,
    Suspended,
    SkipRequested,
}

/// How a successful `suspend` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendOutcome {
    /// The full duration passed.
    Elapsed,
    /// A skip request woke the task early.
    Skipped,
}

struct Inner {
    state: SuspendState,
    interrupted: bool,
}

/// Timed park with manual early release.
pub struct Suspender {
    inner: Mutex<Inner>,
    wake: Condvar,
    policy: SkipPolicy,
}

impl fmt::Debug for Suspender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Suspender")
            .field("state", &inner.state)
            .field("interrupted", &inner.interrupted)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for Suspender {
    fn default() -> Self {
        Self::new(SkipPolicy::default())
    }
}

impl Suspender {
    pub fn new(policy: SkipPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SuspendState::Idle,
                interrupted: false,
            }),
            wake: Condvar::new(),
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> SkipPolicy {
        self.policy
    }

    pub fn state(&self) -> SuspendState {
        self.lock().state
    }

    pub fn is_interrupted(&self) -> bool {
        self.lock().interrupted
    }

    /// Parks the calling thread for up to `duration`.
    ///
    /// # Errors
    /// Returns [`TaskError::Interrupted`] if an interrupt is pending on entry
    /// or arrives while parked. The pending interrupt is cleared.
    pub fn suspend(&self, duration: Duration) -> Result<SuspendOutcome, TaskError> {
        let mut inner = self.lock();

        if inner.interrupted {
            inner.interrupted = false;
            return Err(TaskError::Interrupted);
        }

        if inner.state == SuspendState::SkipRequested {
            inner.state = SuspendState::Idle;
            return Ok(SuspendOutcome::Skipped);
        }

        inner.state = SuspendState::Suspended;
        let deadline = Instant::now().checked_add(duration);

        loop {
            if inner.interrupted {
                inner.interrupted = false;
                inner.state = SuspendState::Idle;
                return Err(TaskError::Interrupted);
            }
            if inner.state == SuspendState::SkipRequested {
                inner.state = SuspendState::Idle;
                return Ok(SuspendOutcome::Skipped);
            }

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                // Overflowing deadline: wait in large slices until woken.
                None => Duration::from_secs(u32::MAX as u64),
            };
            if remaining.is_zero() {
                inner.state = SuspendState::Idle;
                return Ok(SuspendOutcome::Elapsed);
            }

            inner = self
                .wake
                .wait_timeout(inner, remaining)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }

    /// Suspends for a fractional number of milliseconds.
    ///
    /// Negative, NaN or out-of-range values are treated as zero.
    pub fn suspend_millis(&self, millis: f64) -> Result<SuspendOutcome, TaskError> {
        let duration = Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::ZERO);
        self.suspend(duration)
    }

    /// Requests an early wake-up. Never blocks and never fails.
    pub fn skip(&self) {
        let mut inner = self.lock();
        match inner.state {
            SuspendState::Suspended => {
                inner.state = SuspendState::SkipRequested;
                self.wake.notify_all();
            }
            SuspendState::Idle => {
                if self.policy == SkipPolicy::Persist {
                    inner.state = SuspendState::SkipRequested;
                }
            }
            SuspendState::SkipRequested => {}
        }
    }

    /// Flags the task as interrupted and wakes it if parked.
    pub fn interrupt(&self) {
        let mut inner = self.lock();
        inner.interrupted = true;
        self.wake.notify_all();
    }

    /// Clears and returns the pending interrupt flag.
    pub fn take_interrupt(&self) -> bool {
        std::mem::take(&mut self.lock().interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn elapses_without_skip() {
        let suspender = Suspender::default();
        let started = Instant::now();
        let outcome = suspender.suspend(Duration::from_millis(20)).unwrap();
        assert_eq!(outcome, SuspendOutcome::Elapsed);
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(suspender.state(), SuspendState::Idle);
    }

    #[test]
    fn zero_and_negative_durations_return_at_once() {
        let suspender = Suspender::default();
        assert_eq!(suspender.suspend(Duration::ZERO).unwrap(), SuspendOutcome::Elapsed);
        assert_eq!(suspender.suspend_millis(-5.0).unwrap(), SuspendOutcome::Elapsed);
        assert_eq!(suspender.suspend_millis(f64::NAN).unwrap(), SuspendOutcome::Elapsed);
    }

    #[test]
    fn skip_wakes_parked_thread() {
        let suspender = Arc::new(Suspender::default());
        let parked = Arc::clone(&suspender);
        let waiter = thread::spawn(move || {
            let started = Instant::now();
            let outcome = parked.suspend(Duration::from_secs(10));
            (outcome, started.elapsed())
        });

        while suspender.state() != SuspendState::Suspended {
            thread::yield_now();
        }
        suspender.skip();

        let (outcome, elapsed) = waiter.join().unwrap();
        assert_eq!(outcome.unwrap(), SuspendOutcome::Skipped);
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn pending_interrupt_fails_next_suspend_once() {
        let suspender = Suspender::default();
        suspender.interrupt();
        assert_eq!(suspender.suspend(Duration::from_secs(5)), Err(TaskError::Interrupted));
        assert!(!suspender.is_interrupted());
        assert_eq!(suspender.suspend(Duration::ZERO).unwrap(), SuspendOutcome::Elapsed);
    }
}
