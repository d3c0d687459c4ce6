//! # Named Task Pool
//!
//! A fixed-size pool of worker threads running [`NamedTask`]s, with a live
//! name → task registry so that other threads can find a running task and
//! skip its current suspension or interrupt it.
//!
//! ## Key Components
//! - [`NamedTaskPool`]: the public pool, cheap to clone
//! - [`TaskHandle`]: one submission of a task, with its suspender and status
//! - [`TaskRegistry`]: the name → handle map
//! - [`WorkerPool`]: the plain thread pool underneath, with [`ExecutionHooks`]
//! - [`Interrupt`]: cancels a blocked [`NamedTaskPool::submit_all_and_await_with`]
//!
//! ## Task Lifecycle
//! ```text
//! submit ──▶ Queued ──▶ Running ⇄ Suspended ──▶ Completed
//!   │                                              │
//!   └─ registry insert                  registry release (unless kept)
//! ```
//!
//! [`NamedTask`]: relaykit_api::task::NamedTask

pub mod handle;
pub mod interrupt;
pub mod named;
pub mod registry;
pub mod worker;

pub use handle::{TaskHandle, TaskStatus};
pub use interrupt::Interrupt;
pub use named::{NamedTaskPool, PoolMetrics};
pub use registry::TaskRegistry;
pub use worker::{ExecutionHooks, Job, JobMeta, JobOutcome, NoopHooks, PoolStatus, WorkerPool};
