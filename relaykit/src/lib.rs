//! # relaykit
//!
//! Concurrency building blocks for services that run many long-lived,
//! named background jobs and push text streams to HTTP clients.
//!
//! ## Core Components
//!
//! - **Named Task Pool** ([`pool`]): a fixed-size worker pool whose tasks are
//!   registered by name while in flight. Tasks suspend themselves
//!   cooperatively; other threads can look them up to skip the current
//!   suspension or interrupt them.
//! - **Broadcast Stream Hub** ([`hub`]): keeps streaming HTTP responses open
//!   and fans every queued message out to all of them from one distribution
//!   thread, dropping subscribers whose writes fail.
//! - **Statistics** ([`stats`]): accumulators, distributions, counting
//!   matrices and top-N tables for summarising data streams.
//!
//! ## Module Organization
//!
//! - [`pool`]: NamedTaskPool, TaskHandle, TaskRegistry, WorkerPool
//! - [`hub`]: StreamHub, TextStreamHub, Publisher
//! - [`stats`]: Statistics containers
//! - [`config`]: Serde-friendly configuration structs
//! - [`logging`]: tracing subscriber setup and logging macros
//!
//! Shared traits and error types live in `relaykit-api`.

pub mod logging;

pub mod config;
pub mod hub;
pub mod pool;
pub mod stats;

pub use config::{HubConfig, RelayConfig, ResubmitPolicy, TaskPoolConfig};
pub use hub::{HubMetrics, Publisher, StreamHub, TextStreamHub};
pub use pool::{Interrupt, NamedTaskPool, PoolMetrics, TaskHandle, TaskStatus};

pub use relaykit_api::{
    errors::{HubError, PoolError, TaskError},
    suspend::{SkipPolicy, SuspendOutcome},
    task::{FnTask, NamedTask, TaskContext, TaskResult},
};
