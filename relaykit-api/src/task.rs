//! # Named Tasks
//!
//! A [`NamedTask`] is a unit of work identified by a name while it is in
//! flight on a pool. The pool hands every run a [`TaskContext`] through which
//! the task can suspend itself and observe interruption.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::time::Duration;
//! use relaykit_api::task::{NamedTask, TaskContext, TaskResult};
//!
//! struct Poller {
//!     name: String,
//! }
//!
//! impl NamedTask for Poller {
//!     fn name(&self) -> &str {
//!         &self.name
//!     }
//!
//!     fn run(&self, ctx: &TaskContext<'_>) -> TaskResult {
//!         for _ in 0..3 {
//!             // Another thread can cut this short with `handle.skip()`.
//!             ctx.suspend(Duration::from_millis(10))?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use downcast_rs::{impl_downcast, DowncastSync};

use crate::errors::TaskError;
use crate::suspend::{SuspendOutcome, Suspender};

/// Result returned by a task body.
pub type TaskResult = anyhow::Result<()>;

/// A nameable unit of work that can run on a task pool.
///
/// Implementors are shared between the worker running them and any thread
/// that looks them up by name, hence `Send + Sync`.
pub trait NamedTask: DowncastSync {
    /// Name used for registry lookups. Must stay stable for the task's life.
    fn name(&self) -> &str;

    /// Runs the task body on a worker thread.
    fn run(&self, ctx: &TaskContext<'_>) -> TaskResult;
}
impl_downcast!(sync NamedTask);

/// Per-run view of the task's execution environment.
pub struct TaskContext<'a> {
    name: &'a str,
    suspender: &'a Suspender,
}

impl fmt::Debug for TaskContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("name", &self.name)
            .field("suspender", self.suspender)
            .finish()
    }
}

impl<'a> TaskContext<'a> {
    pub fn new(name: &'a str, suspender: &'a Suspender) -> Self {
        Self { name, suspender }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Parks the current run for up to `duration`, or until skipped.
    pub fn suspend(&self, duration: Duration) -> Result<SuspendOutcome, TaskError> {
        self.suspender.suspend(duration)
    }

    /// Like [`suspend`](Self::suspend) with fractional milliseconds.
    pub fn suspend_millis(&self, millis: f64) -> Result<SuspendOutcome, TaskError> {
        self.suspender.suspend_millis(millis)
    }

    /// Whether an interrupt is pending. Does not clear it.
    pub fn is_interrupted(&self) -> bool {
        self.suspender.is_interrupted()
    }

    /// Clears a pending interrupt, returning whether one was set.
    pub fn take_interrupt(&self) -> bool {
        self.suspender.take_interrupt()
    }
}

/// A [`NamedTask`] built from a closure.
pub struct FnTask<F> {
    name: String,
    body: F,
}

impl<F> FnTask<F>
where
    F: Fn(&TaskContext<'_>) -> TaskResult + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl<F> fmt::Debug for FnTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask").field("name", &self.name).finish()
    }
}

impl<F> NamedTask for FnTask<F>
where
    F: Fn(&TaskContext<'_>) -> TaskResult + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &TaskContext<'_>) -> TaskResult {
        (self.body)(ctx)
    }
}
