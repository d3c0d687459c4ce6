//! # Error Types
//!
//! Error enums shared by the task pool and the stream hub. Each concern has
//! its own enum so callers can match on exactly the failures an operation
//! can produce.
//!
//! ## Usage Example
//!
//! ```rust
//! use relaykit_api::errors::TaskError;
//!
//! fn describe(err: &TaskError) -> &'static str {
//!     match err {
//!         TaskError::Interrupted => "stopped early",
//!         TaskError::Failed(_) => "failed",
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Errors surfaced to task code while it runs on the pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task was interrupted while suspended (or had an interrupt pending
    /// when it asked to suspend). The interrupt is consumed by this error.
    #[error("Task was interrupted")]
    Interrupted,
    #[error("Task failed: {0}")]
    Failed(String),
}

/// Errors related to the named task pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Task pool is shutting down")]
    ShuttingDown,
    /// Only produced when the pool rejects resubmission under a live name.
    #[error("A task named '{0}' is already registered")]
    NameInUse(String),
    #[error("Failed to spawn worker thread: {0}")]
    SpawnFailed(String),
    #[error("Failed to join worker thread: {0}")]
    JoinFailed(String),
}

/// Errors related to the broadcast stream hub.
#[derive(Error, Debug)]
pub enum HubError {
    /// The connection cannot be held open asynchronously.
    #[error("Streaming requires async support from the server")]
    AsyncNotSupported,
    #[error("Stream hub is shut down")]
    ShutDown,
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),
    #[error("Failed to spawn distribution thread: {0}")]
    SpawnFailed(String),
}
