use std::time::Duration;

use relaykit::config::{
    ConfigError, HubConfig, RelayConfig, ResubmitPolicy, TaskPoolConfig,
    DEFAULT_CONTENT_TYPE, DEFAULT_FRAME_DELIMITER,
};
use relaykit::logging::LogConfig;
use relaykit_api::suspend::SkipPolicy;
use tracing::Level;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_defaults() {
        let config = TaskPoolConfig::default();
        assert_eq!(config.pool_size, num_cpus::get());
        assert_eq!(config.await_poll_interval(), Duration::from_secs(60));
        assert_eq!(config.skip_policy, SkipPolicy::Persist);
        assert_eq!(config.resubmit_policy, ResubmitPolicy::Replace);
        assert_eq!(config.thread_name_prefix, "relaykit-worker");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hub_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(config.character_encoding.as_deref(), Some("UTF-8"));
        assert_eq!(config.async_timeout(), Duration::ZERO);
        assert_eq!(config.frame_delimiter, DEFAULT_FRAME_DELIMITER);
        assert_eq!(config.distribution_thread_name, "relaykit-distribution");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "pool": { "pool_size": 4, "resubmit_policy": "reject" },
            "hub": { "content_type": "application/x-ndjson", "async_timeout_ms": 30000 },
            "logging": { "level": "debug" }
        }"#;
        let config: RelayConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.pool.pool_size, 4);
        assert_eq!(config.pool.resubmit_policy, ResubmitPolicy::Reject);
        assert_eq!(config.pool.skip_policy, SkipPolicy::Persist);
        assert_eq!(config.hub.content_type, "application/x-ndjson");
        assert_eq!(config.hub.async_timeout(), Duration::from_secs(30));
        assert_eq!(config.hub.frame_delimiter, "\r\n");
        assert!(config.validate().is_ok());

        let log = LogConfig::from(&config.logging);
        assert_eq!(log.level, Level::DEBUG);
        assert!(!log.json_format);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: RelayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = RelayConfig::default();
        config.pool.pool_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyPool));

        config.pool.pool_size = 1;
        config.pool.await_poll_interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));

        config.pool.await_poll_interval_ms = 10;
        config.hub.frame_delimiter.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyDelimiter));
        assert_eq!(
            ConfigError::EmptyDelimiter.to_string(),
            "Frame delimiter must not be empty"
        );
    }

    #[test]
    fn test_round_trip_keeps_policies() {
        let config = TaskPoolConfig {
            skip_policy: SkipPolicy::DiscardWhenIdle,
            ..TaskPoolConfig::with_pool_size(2)
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"discard_when_idle\""));

        let parsed: TaskPoolConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
