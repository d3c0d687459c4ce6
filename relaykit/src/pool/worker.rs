//! # Worker Pool
//!
//! A fixed set of OS threads pulling [`Job`]s from one unbounded queue.
//!
//! ## Key Concepts
//! - Jobs are boxed closures tagged with a [`JobMeta`] (task name and ticket)
//! - Every job runs inside a `task{name, ticket}` tracing span
//! - Errors and panics are contained per job; a worker never dies from them
//! - [`ExecutionHooks`] observe each job before and after it runs
//!
//! ## Termination
//! Each worker owns a sender of a private "done" channel that nothing ever
//! sends on. When the last worker exits, the channel disconnects, which is
//! what [`WorkerPool::await_termination`] and
//! [`WorkerPool::await_termination_or`] wait for.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, warn};

use relaykit_api::errors::PoolError;

/// Work carried by a [`Job`].
pub type Work = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Identity of a job, handed to [`ExecutionHooks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMeta {
    pub name: String,
    pub ticket: u64,
}

/// A unit of work queued on a [`WorkerPool`].
pub struct Job {
    pub meta: JobMeta,
    work: Work,
}

impl Job {
    pub fn new<F>(name: impl Into<String>, ticket: u64, work: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            meta: JobMeta {
                name: name.into(),
                ticket,
            },
            work: Box::new(work),
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("meta", &self.meta).finish()
    }
}

/// How a job ended.
#[derive(Debug)]
pub enum JobOutcome {
    Completed,
    Failed(anyhow::Error),
    Panicked(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed)
    }
}

/// Callbacks around every job execution, run on the worker thread.
///
/// Both methods default to no-ops. A panicking hook is logged and ignored.
pub trait ExecutionHooks: Send + Sync {
    fn before_execute(&self, _job: &JobMeta) {}

    fn after_execute(&self, _job: &JobMeta, _outcome: &JobOutcome) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl ExecutionHooks for NoopHooks {}

/// Lifecycle of a [`WorkerPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Accepting jobs
    Running = 0,

    /// No longer accepting jobs; queued jobs still run
    ShuttingDown = 1,

    /// Every worker has exited
    Terminated = 2,
}

impl PoolStatus {
    fn from_usize(value: usize) -> Self {
        match value {
            0 => PoolStatus::Running,
            1 => PoolStatus::ShuttingDown,
            _ => PoolStatus::Terminated,
        }
    }
}

/// What ended a call to [`WorkerPool::await_termination_or`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Terminated,
    Interrupted,
    TimedOut,
}

/// Fixed-size pool of named worker threads.
pub struct WorkerPool {
    pool_size: usize,

    /// Taken on shutdown; dropping it lets idle workers exit
    job_tx: Mutex<Option<Sender<Job>>>,

    /// Kept for draining and queue length
    job_rx: Receiver<Job>,

    /// Disconnects once every worker has exited
    done_rx: Receiver<()>,

    active: Arc<AtomicUsize>,

    status: AtomicUsize,

    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("pool_size", &self.pool_size)
            .field("queued", &self.queued())
            .field("active", &self.active())
            .field("status", &self.status())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WorkerPool {
    /// Spawns `pool_size` threads named `{thread_name_prefix}-{index}`.
    ///
    /// # Errors
    /// [`PoolError::SpawnFailed`] if a thread cannot be created. Threads
    /// spawned before the failure exit on their own.
    pub fn new(
        pool_size: usize,
        thread_name_prefix: &str,
        hooks: Arc<dyn ExecutionHooks>,
    ) -> Result<Self, PoolError> {
        let (job_tx, job_rx) = flume::unbounded::<Job>();
        let (done_tx, done_rx) = flume::bounded::<()>(1);
        let active = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(pool_size);
        for id in 0..pool_size {
            let jobs = job_rx.clone();
            let done = done_tx.clone();
            let hooks = Arc::clone(&hooks);
            let active = Arc::clone(&active);

            let handle = thread::Builder::new()
                .name(format!("{}-{}", thread_name_prefix, id))
                .spawn(move || worker_loop(id, jobs, hooks, active, done))
                .map_err(|e| PoolError::SpawnFailed(e.to_string()))?;
            workers.push(handle);
        }
        drop(done_tx);

        debug!(pool_size, prefix = thread_name_prefix, "worker pool started");

        Ok(Self {
            pool_size,
            job_tx: Mutex::new(Some(job_tx)),
            job_rx,
            done_rx,
            active,
            status: AtomicUsize::new(PoolStatus::Running as usize),
            workers: Mutex::new(workers),
        })
    }

    /// Queues a job. Never blocks.
    ///
    /// # Errors
    /// [`PoolError::ShuttingDown`] once [`shutdown`](Self::shutdown) ran.
    pub fn execute(&self, job: Job) -> Result<(), PoolError> {
        self.execute_with(|| Ok(job))
    }

    /// Builds a job with `prepare` and queues it, holding the submission
    /// lock throughout so a concurrent [`shutdown`](Self::shutdown) either
    /// happens before `prepare` runs or after the job is queued.
    ///
    /// # Errors
    /// [`PoolError::ShuttingDown`] once shut down, without calling
    /// `prepare`; otherwise whatever `prepare` returns.
    pub fn execute_with<F>(&self, prepare: F) -> Result<(), PoolError>
    where
        F: FnOnce() -> Result<Job, PoolError>,
    {
        let guard = lock(&self.job_tx);
        let sender = guard.as_ref().ok_or(PoolError::ShuttingDown)?;
        let job = prepare()?;
        sender.send(job).map_err(|_| PoolError::ShuttingDown)
    }

    /// Stops accepting jobs. Already queued jobs still run.
    pub fn shutdown(&self) {
        if lock(&self.job_tx).take().is_some() {
            self.status
                .store(PoolStatus::ShuttingDown as usize, Ordering::SeqCst);
            debug!("worker pool shutting down");
        }
    }

    /// Stops accepting jobs and removes every job that has not started yet.
    pub fn shutdown_now(&self) -> Vec<Job> {
        self.shutdown();
        self.job_rx.try_iter().collect()
    }

    pub fn is_shutdown(&self) -> bool {
        lock(&self.job_tx).is_none()
    }

    pub fn is_terminated(&self) -> bool {
        let terminated = matches!(self.done_rx.try_recv(), Err(TryRecvError::Disconnected));
        if terminated {
            self.mark_terminated();
        }
        terminated
    }

    /// Blocks until every worker has exited or `timeout` passes.
    ///
    /// Returns `true` if the pool terminated.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        match self.done_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => {
                self.mark_terminated();
                true
            }
            Ok(()) | Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Like [`await_termination`](Self::await_termination), but also returns
    /// when `interrupt` disconnects.
    pub fn await_termination_or(&self, interrupt: &Receiver<()>, timeout: Duration) -> Wake {
        let wake = flume::Selector::new()
            .recv(&self.done_rx, |result| match result {
                Err(_) => Wake::Terminated,
                Ok(()) => Wake::TimedOut,
            })
            .recv(interrupt, |result| match result {
                Err(_) => Wake::Interrupted,
                Ok(()) => Wake::TimedOut,
            })
            .wait_timeout(timeout)
            .unwrap_or(Wake::TimedOut);

        if wake == Wake::Terminated {
            self.mark_terminated();
        }
        wake
    }

    /// Joins every worker thread. Call only after termination, or it blocks
    /// until the workers exit.
    ///
    /// # Errors
    /// [`PoolError::JoinFailed`] if a worker thread itself panicked.
    pub fn join(&self) -> Result<(), PoolError> {
        let workers: Vec<_> = lock(&self.workers).drain(..).collect();
        for worker in workers {
            let name = worker.thread().name().unwrap_or("worker").to_string();
            worker
                .join()
                .map_err(|_| PoolError::JoinFailed(format!("{} panicked", name)))?;
        }
        Ok(())
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Jobs waiting in the queue.
    pub fn queued(&self) -> usize {
        self.job_rx.len()
    }

    /// Jobs currently executing.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> PoolStatus {
        match PoolStatus::from_usize(self.status.load(Ordering::SeqCst)) {
            PoolStatus::ShuttingDown if self.is_terminated() => PoolStatus::Terminated,
            status => status,
        }
    }

    fn mark_terminated(&self) {
        self.status
            .store(PoolStatus::Terminated as usize, Ordering::SeqCst);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker main loop; `_done` is dropped when the loop ends.
fn worker_loop(
    id: usize,
    jobs: Receiver<Job>,
    hooks: Arc<dyn ExecutionHooks>,
    active: Arc<AtomicUsize>,
    _done: Sender<()>,
) {
    while let Ok(job) = jobs.recv() {
        active.fetch_add(1, Ordering::SeqCst);
        run_job(job, hooks.as_ref());
        active.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(worker = id, "worker exited");
}

fn run_job(job: Job, hooks: &dyn ExecutionHooks) {
    let Job { meta, work } = job;
    let span = crate::task_span!(meta.name, meta.ticket);
    let _entered = span.enter();

    guarded("before_execute", || hooks.before_execute(&meta));

    let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(())) => JobOutcome::Completed,
        Ok(Err(err)) => {
            crate::log_error!(err, "task failed");
            JobOutcome::Failed(err)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            crate::log_error!(message, "task panicked");
            JobOutcome::Panicked(message)
        }
    };

    guarded("after_execute", || hooks.after_execute(&meta, &outcome));
}

fn guarded(hook: &str, call: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
        warn!(hook, panic = %panic_message(payload.as_ref()), "execution hook panicked");
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Recording {
        before: AtomicUsize,
        completed: AtomicUsize,
        failed: AtomicUsize,
        panicked: AtomicUsize,
    }

    impl ExecutionHooks for Recording {
        fn before_execute(&self, _job: &JobMeta) {
            self.before.fetch_add(1, Ordering::SeqCst);
        }

        fn after_execute(&self, _job: &JobMeta, outcome: &JobOutcome) {
            let counter = match outcome {
                JobOutcome::Completed => &self.completed,
                JobOutcome::Failed(_) => &self.failed,
                JobOutcome::Panicked(_) => &self.panicked,
            };
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn outcomes_reach_hooks_and_workers_survive() {
        let hooks = Arc::new(Recording::default());
        let pool = WorkerPool::new(1, "unit-worker", hooks.clone()).unwrap();

        pool.execute(Job::new("ok", 1, || Ok(()))).unwrap();
        pool.execute(Job::new("err", 2, || Err(anyhow::anyhow!("boom"))))
            .unwrap();
        pool.execute(Job::new("panic", 3, || panic!("kaboom"))).unwrap();
        pool.execute(Job::new("ok-again", 4, || Ok(()))).unwrap();

        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)));
        pool.join().unwrap();

        assert_eq!(hooks.before.load(Ordering::SeqCst), 4);
        assert_eq!(hooks.completed.load(Ordering::SeqCst), 2);
        assert_eq!(hooks.failed.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.panicked.load(Ordering::SeqCst), 1);
        assert_eq!(pool.status(), PoolStatus::Terminated);
    }

    #[test]
    fn execute_after_shutdown_is_rejected() {
        let pool = WorkerPool::new(1, "unit-worker", Arc::new(NoopHooks)).unwrap();
        pool.shutdown();

        let err = pool.execute(Job::new("late", 1, || Ok(()))).unwrap_err();
        assert_eq!(err, PoolError::ShuttingDown);
        assert!(pool.is_shutdown());
    }

    #[test]
    fn execute_with_skips_prepare_after_shutdown() {
        let pool = WorkerPool::new(1, "unit-worker", Arc::new(NoopHooks)).unwrap();
        let prepared = AtomicUsize::new(0);

        pool.execute_with(|| {
            prepared.fetch_add(1, Ordering::SeqCst);
            Ok(Job::new("first", 1, || Ok(())))
        })
        .unwrap();

        pool.shutdown();
        let err = pool
            .execute_with(|| {
                prepared.fetch_add(1, Ordering::SeqCst);
                Ok(Job::new("late", 2, || Ok(())))
            })
            .unwrap_err();

        assert_eq!(err, PoolError::ShuttingDown);
        assert_eq!(prepared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn execute_with_passes_prepare_errors_through() {
        let pool = WorkerPool::new(1, "unit-worker", Arc::new(NoopHooks)).unwrap();
        let err = pool
            .execute_with(|| Err(PoolError::NameInUse("busy".to_string())))
            .unwrap_err();

        assert_eq!(err, PoolError::NameInUse("busy".to_string()));
        assert_eq!(pool.queued(), 0);
    }

    #[test]
    fn status_turns_terminated_once_workers_exit() {
        let pool = WorkerPool::new(2, "unit-worker", Arc::new(NoopHooks)).unwrap();
        pool.shutdown();
        pool.join().unwrap();

        assert_eq!(pool.status(), PoolStatus::Terminated);
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
