use relaykit_api::errors::{HubError, PoolError, TaskError};
use std::error::Error;
use std::io;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_display() {
        assert_eq!(TaskError::Interrupted.to_string(), "Task was interrupted");
        assert_eq!(
            TaskError::Failed("disk full".to_string()).to_string(),
            "Task failed: disk full"
        );
        assert!(TaskError::Interrupted.source().is_none());
    }

    #[test]
    fn test_pool_error_display() {
        assert_eq!(PoolError::ShuttingDown.to_string(), "Task pool is shutting down");
        assert_eq!(
            PoolError::NameInUse("worker-1".to_string()).to_string(),
            "A task named 'worker-1' is already registered"
        );
        assert_eq!(
            PoolError::SpawnFailed("out of threads".to_string()).to_string(),
            "Failed to spawn worker thread: out of threads"
        );
        assert_eq!(
            PoolError::JoinFailed("worker panicked".to_string()).to_string(),
            "Failed to join worker thread: worker panicked"
        );
    }

    #[test]
    fn test_hub_error_display() {
        assert_eq!(
            HubError::AsyncNotSupported.to_string(),
            "Streaming requires async support from the server"
        );
        assert_eq!(HubError::ShutDown.to_string(), "Stream hub is shut down");
        assert_eq!(
            HubError::SpawnFailed("limit".to_string()).to_string(),
            "Failed to spawn distribution thread: limit"
        );
    }

    #[test]
    fn test_hub_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "peer went away");
        let err: HubError = io_err.into();

        assert!(matches!(err, HubError::Transport(_)));
        assert!(err.to_string().contains("peer went away"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_task_error_converts_into_anyhow() {
        fn body() -> anyhow::Result<()> {
            Err(TaskError::Interrupted)?;
            Ok(())
        }

        let err = body().unwrap_err();
        assert_eq!(err.downcast_ref::<TaskError>(), Some(&TaskError::Interrupted));
    }
}
