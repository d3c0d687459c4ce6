use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use relaykit_api::suspend::SkipPolicy;

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";
pub const DEFAULT_FRAME_DELIMITER: &str = "\r\n";

// --- Configuration Enums ---

/// Decides what happens when a task is submitted under a name that is still
/// registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResubmitPolicy {
    /// The new submission overwrites the registry entry; the older task keeps
    /// running but can no longer be looked up by name.
    #[default]
    Replace,
    /// The submission fails with `PoolError::NameInUse` while a queued or
    /// running task holds the name. Completed entries kept after execution
    /// can still be overwritten.
    Reject,
}

/// Errors found while validating a configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Pool size must be at least 1")]
    EmptyPool,
    #[error("Await poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("Frame delimiter must not be empty")]
    EmptyDelimiter,
}

// --- Task Pool Configuration ---

/// Configuration for the `NamedTaskPool`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPoolConfig {
    /// The number of worker threads.
    pub pool_size: usize,

    /// How often `submit_all_and_await` re-checks for termination, in
    /// milliseconds.
    pub await_poll_interval_ms: u64,

    /// Handling of skip requests that arrive while a task is not suspended.
    pub skip_policy: SkipPolicy,

    /// Handling of submissions under a name that is already registered.
    pub resubmit_policy: ResubmitPolicy,

    /// Prefix for worker thread names; workers are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: num_cpus::get(),
            await_poll_interval_ms: 60_000,
            skip_policy: SkipPolicy::Persist,
            resubmit_policy: ResubmitPolicy::Replace,
            thread_name_prefix: "relaykit-worker".to_string(),
        }
    }
}

impl TaskPoolConfig {
    /// Default configuration with an explicit number of workers.
    pub fn with_pool_size(pool_size: usize) -> Self {
        Self {
            pool_size,
            ..Default::default()
        }
    }

    pub fn await_poll_interval(&self) -> Duration {
        Duration::from_millis(self.await_poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.await_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

// --- Stream Hub Configuration ---

/// Configuration for `StreamHub` and `TextStreamHub`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Content type sent with every streaming response.
    pub content_type: String,

    /// Character encoding; left unset on the response when `None`.
    pub character_encoding: Option<String>,

    /// Transport-side timeout for held-open responses, in milliseconds.
    /// Zero means the hub, not the transport, controls channel lifetime.
    pub async_timeout_ms: u64,

    /// Delimiter written after every broadcast message.
    pub frame_delimiter: String,

    /// Name of the distribution thread.
    pub distribution_thread_name: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            character_encoding: Some("UTF-8".to_string()),
            async_timeout_ms: 0,
            frame_delimiter: DEFAULT_FRAME_DELIMITER.to_string(),
            distribution_thread_name: "relaykit-distribution".to_string(),
        }
    }
}

impl HubConfig {
    pub fn async_timeout(&self) -> Duration {
        Duration::from_millis(self.async_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        Ok(())
    }
}

// --- Top-level Configuration ---

/// Everything a host needs to build the toolbox components.
///
/// Built once at startup (by whatever loader the host prefers) and passed
/// into constructors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub pool: TaskPoolConfig,
    pub hub: HubConfig,
    pub logging: LoggingSection,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()?;
        self.hub.validate()
    }
}

/// Serializable subset of `logging::LogConfig`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
    pub json_format: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            target_filters: None,
        }
    }
}
