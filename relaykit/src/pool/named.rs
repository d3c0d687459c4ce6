use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use relaykit_api::errors::PoolError;
use relaykit_api::task::NamedTask;
use relaykit_api::types::SharedTask;

use super::handle::TaskHandle;
use super::interrupt::Interrupt;
use super::registry::TaskRegistry;
use super::worker::{ExecutionHooks, Job, NoopHooks, PoolStatus, Wake, WorkerPool};
use crate::config::TaskPoolConfig;
use crate::log_task;

/// Point-in-time view of a [`NamedTaskPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Number of worker threads in the pool
    pub pool_size: usize,

    /// Submitted tasks not yet picked up by a worker
    pub queued: usize,

    /// Tasks currently running
    pub active: usize,

    /// Entries in the name registry
    pub registered: usize,

    pub status: PoolStatus,
}

struct PoolInner {
    config: TaskPoolConfig,
    workers: WorkerPool,
    registry: Arc<TaskRegistry>,
    next_ticket: AtomicU64,
}

/// Fixed-size worker pool whose in-flight tasks can be looked up by name.
///
/// Cloning is cheap; clones share the same workers and registry.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use relaykit::config::TaskPoolConfig;
/// use relaykit::pool::NamedTaskPool;
/// use relaykit_api::task::FnTask;
///
/// let pool = NamedTaskPool::new(TaskPoolConfig::with_pool_size(2))?;
/// let handle = pool.submit(FnTask::new("poller", |ctx| {
///     ctx.suspend(Duration::from_secs(60))?;
///     Ok(())
/// }))?;
///
/// // Somewhere else: wake the poller early.
/// if let Some(poller) = pool.lookup("poller") {
///     poller.skip();
/// }
/// # drop(handle);
/// # Ok::<(), relaykit_api::errors::PoolError>(())
/// ```
#[derive(Clone)]
pub struct NamedTaskPool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for NamedTaskPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedTaskPool")
            .field("config", &self.inner.config)
            .field("workers", &self.inner.workers)
            .field("registered", &self.inner.registry.len())
            .finish()
    }
}

/// Releases a registry entry when a run ends, including by panic.
struct Release<'a> {
    registry: &'a TaskRegistry,
    handle: &'a TaskHandle,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        if self.handle.keep_after_completion() {
            log_task!(self.handle.name(), "kept", ticket = self.handle.ticket());
            return;
        }
        if self
            .registry
            .release(self.handle.name(), self.handle.ticket())
            .is_some()
        {
            log_task!(self.handle.name(), "released", ticket = self.handle.ticket());
        }
    }
}

impl NamedTaskPool {
    /// Starts `config.pool_size` workers.
    ///
    /// # Errors
    /// [`PoolError::SpawnFailed`] if the configuration is invalid or a
    /// worker thread cannot be spawned.
    pub fn new(config: TaskPoolConfig) -> Result<Self, PoolError> {
        Self::with_hooks(config, Arc::new(NoopHooks))
    }

    /// Like [`new`](Self::new), with callbacks around every task run.
    pub fn with_hooks(
        config: TaskPoolConfig,
        hooks: Arc<dyn ExecutionHooks>,
    ) -> Result<Self, PoolError> {
        config
            .validate()
            .map_err(|e| PoolError::SpawnFailed(e.to_string()))?;

        let workers = WorkerPool::new(config.pool_size, &config.thread_name_prefix, hooks)?;
        info!(pool_size = config.pool_size, "named task pool started");

        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                workers,
                registry: Arc::new(TaskRegistry::new()),
                next_ticket: AtomicU64::new(1),
            }),
        })
    }

    pub fn config(&self) -> &TaskPoolConfig {
        &self.inner.config
    }

    /// Submits a task whose registry entry is dropped when it finishes.
    pub fn submit<T: NamedTask>(&self, task: T) -> Result<Arc<TaskHandle>, PoolError> {
        self.submit_shared(Arc::new(task), false)
    }

    /// Submits a task, optionally keeping its registry entry after it
    /// finishes until [`remove`](Self::remove) or a same-named resubmission.
    pub fn submit_with<T: NamedTask>(
        &self,
        task: T,
        keep_after_completion: bool,
    ) -> Result<Arc<TaskHandle>, PoolError> {
        self.submit_shared(Arc::new(task), keep_after_completion)
    }

    /// Registers `task` under its name, then queues it.
    ///
    /// # Errors
    /// - [`PoolError::ShuttingDown`] after shutdown
    /// - [`PoolError::NameInUse`] when the resubmit policy rejects the name
    pub fn submit_shared(
        &self,
        task: SharedTask,
        keep_after_completion: bool,
    ) -> Result<Arc<TaskHandle>, PoolError> {
        let inner = &self.inner;
        let ticket = inner.next_ticket.fetch_add(1, Ordering::SeqCst);
        let handle = Arc::new(TaskHandle::new(
            ticket,
            task,
            inner.config.skip_policy,
            keep_after_completion,
        ));

        // Insert and enqueue share the submission lock: a shutdown sees both or neither.
        inner.workers.execute_with(|| {
            if let Some(previous) = inner
                .registry
                .insert(Arc::clone(&handle), inner.config.resubmit_policy)?
            {
                debug!(
                    task = %handle.name(),
                    previous_ticket = previous.ticket(),
                    "registry entry replaced"
                );
            }

            let registry = Arc::clone(&inner.registry);
            let running = Arc::clone(&handle);
            Ok(Job::new(handle.name(), ticket, move || {
                let _release = Release {
                    registry: &registry,
                    handle: &running,
                };
                running.execute()
            }))
        })?;

        log_task!(handle.name(), "submitted", ticket = ticket);
        Ok(handle)
    }

    /// Submits every task, shuts the pool down and blocks until all of them
    /// have finished.
    pub fn submit_all_and_await<I>(&self, tasks: I) -> Result<bool, PoolError>
    where
        I: IntoIterator<Item = SharedTask>,
    {
        self.submit_all_and_await_with(tasks, &Interrupt::new())
    }

    /// Submits every task, shuts the pool down, then waits for termination
    /// in increments of the configured poll interval.
    ///
    /// Returns `Ok(true)` once every worker has exited, or `Ok(false)` if
    /// `interrupt` fired first. Tasks keep running in the background after an
    /// interrupted wait.
    ///
    /// # Errors
    /// The first submission error; the pool is left running in that case.
    pub fn submit_all_and_await_with<I>(
        &self,
        tasks: I,
        interrupt: &Interrupt,
    ) -> Result<bool, PoolError>
    where
        I: IntoIterator<Item = SharedTask>,
    {
        for task in tasks {
            self.submit_shared(task, false)?;
        }
        self.shutdown();

        let poll = self.inner.config.await_poll_interval();
        loop {
            match self.inner.workers.await_termination_or(interrupt.signal(), poll) {
                Wake::Terminated => {
                    self.inner.workers.join()?;
                    return Ok(true);
                }
                Wake::Interrupted => {
                    info!("wait for task pool termination interrupted");
                    return Ok(false);
                }
                Wake::TimedOut => {
                    debug!(
                        queued = self.inner.workers.queued(),
                        active = self.inner.workers.active(),
                        "still waiting for task pool termination"
                    );
                }
            }
        }
    }

    /// The task currently registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<Arc<TaskHandle>> {
        self.inner.registry.get(name)
    }

    /// Every registered task whose name starts with `prefix`, in no
    /// particular order.
    pub fn lookup_by_prefix(&self, prefix: &str) -> Vec<Arc<TaskHandle>> {
        self.inner.registry.with_prefix(prefix)
    }

    pub fn all_tasks(&self) -> Vec<Arc<TaskHandle>> {
        self.inner.registry.all()
    }

    /// Drops the registry entry for `name`, typically one kept after
    /// completion. A running task is not affected.
    pub fn remove(&self, name: &str) -> Option<Arc<TaskHandle>> {
        self.inner.registry.remove(name)
    }

    /// Stops accepting tasks. Queued tasks still run.
    pub fn shutdown(&self) {
        self.inner.workers.shutdown();
    }

    /// Stops accepting tasks, discards the ones not yet started and
    /// interrupts every registered task.
    ///
    /// Returns the handles of the discarded tasks.
    pub fn shutdown_now(&self) -> Vec<Arc<TaskHandle>> {
        let registry = &self.inner.registry;
        let drained: Vec<_> = self
            .inner
            .workers
            .shutdown_now()
            .into_iter()
            .filter_map(|job| registry.release(&job.meta.name, job.meta.ticket))
            .collect();

        for handle in registry.all() {
            handle.interrupt();
        }

        info!(discarded = drained.len(), "task pool shut down immediately");
        drained
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.workers.is_shutdown()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.workers.is_terminated()
    }

    /// Blocks up to `timeout` for every worker to exit after shutdown.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        self.inner.workers.await_termination(timeout)
    }

    /// [`await_termination`](Self::await_termination) for async callers; the
    /// wait runs on tokio's blocking pool.
    pub async fn await_termination_async(&self, timeout: Duration) -> Result<bool, PoolError> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.await_termination(timeout))
            .await
            .map_err(|e| PoolError::JoinFailed(e.to_string()))
    }

    pub fn metrics(&self) -> PoolMetrics {
        let workers = &self.inner.workers;
        PoolMetrics {
            pool_size: workers.pool_size(),
            queued: workers.queued(),
            active: workers.active(),
            registered: self.inner.registry.len(),
            status: workers.status(),
        }
    }
}
