//! # relaykit API
//!
//! Interfaces shared between `relaykit` and the applications hosting it.
//!
//! ## Core Components
//!
//! - **Named tasks**: the [`NamedTask`] trait and the per-run [`TaskContext`]
//! - **Suspension**: the [`Suspender`] timed-park primitive with skip and
//!   interrupt
//! - **Transport**: the traits a host HTTP server implements so the stream hub
//!   can hold responses open and write to them
//! - **Errors**: error enums for tasks, pools and hubs
//!
//! ## Module Organization
//!
//! - [`task`]: Named task trait, context and closure adapter
//! - [`suspend`]: Suspend/skip state machine
//! - [`transport`]: Streaming request/response boundary
//! - [`errors`]: Error types
//! - [`types`]: Common type definitions

pub mod errors;
pub mod suspend;
pub mod task;
pub mod transport;
pub mod types;

pub use errors::{HubError, PoolError, TaskError};
pub use suspend::{SkipPolicy, SuspendOutcome, SuspendState, Suspender};
pub use task::{FnTask, NamedTask, TaskContext, TaskResult};
pub use transport::{AsyncContext, AsyncListener, StreamRequest, StreamResponse};
pub use types::{ChannelId, SharedChannel, SharedTask};
