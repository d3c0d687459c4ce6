use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use relaykit_api::suspend::{SkipPolicy, SuspendState, Suspender};
use relaykit_api::task::{NamedTask, TaskContext, TaskResult};
use relaykit_api::types::SharedTask;

/// Where a submitted task is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Running,
    /// Running and parked in `suspend`
    Suspended,
    Completed,
}

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;

/// A submitted task as seen through the registry.
///
/// Every submission gets its own handle and ticket, so two submissions under
/// the same name never share suspension state.
pub struct TaskHandle {
    name: String,
    ticket: u64,
    task: SharedTask,
    suspender: Suspender,
    keep_after_completion: bool,
    phase: AtomicU8,
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.name)
            .field("ticket", &self.ticket)
            .field("status", &self.status())
            .field("keep_after_completion", &self.keep_after_completion)
            .finish()
    }
}

impl TaskHandle {
    pub(crate) fn new(
        ticket: u64,
        task: SharedTask,
        skip_policy: SkipPolicy,
        keep_after_completion: bool,
    ) -> Self {
        Self {
            name: task.name().to_string(),
            ticket,
            task,
            suspender: Suspender::new(skip_policy),
            keep_after_completion,
            phase: AtomicU8::new(QUEUED),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submission number, unique within one pool.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn task(&self) -> &SharedTask {
        &self.task
    }

    /// The registered task as its concrete type.
    pub fn task_as<T: NamedTask>(&self) -> Option<&T> {
        self.task.downcast_ref::<T>()
    }

    pub fn keep_after_completion(&self) -> bool {
        self.keep_after_completion
    }

    pub fn status(&self) -> TaskStatus {
        match self.phase.load(Ordering::SeqCst) {
            QUEUED => TaskStatus::Queued,
            RUNNING if self.suspender.state() == SuspendState::Suspended => TaskStatus::Suspended,
            RUNNING => TaskStatus::Running,
            _ => TaskStatus::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase.load(Ordering::SeqCst) == COMPLETED
    }

    pub fn suspend_state(&self) -> SuspendState {
        self.suspender.state()
    }

    /// Wakes the task early from its current (or, depending on the skip
    /// policy, next) suspend.
    pub fn skip(&self) {
        self.suspender.skip();
    }

    /// Cooperatively interrupts the task; its next or current suspend fails
    /// with `TaskError::Interrupted`.
    pub fn interrupt(&self) {
        self.suspender.interrupt();
    }

    /// Runs the task on the calling thread. Marks the handle completed even
    /// when the task panics.
    pub(crate) fn execute(&self) -> TaskResult {
        struct Finish<'a>(&'a AtomicU8);

        impl Drop for Finish<'_> {
            fn drop(&mut self) {
                self.0.store(COMPLETED, Ordering::SeqCst);
            }
        }

        self.phase.store(RUNNING, Ordering::SeqCst);
        let _finish = Finish(&self.phase);

        let ctx = TaskContext::new(&self.name, &self.suspender);
        self.task.run(&ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaykit_api::task::FnTask;
    use std::sync::Arc;

    #[test]
    fn execute_moves_through_phases() {
        let handle = TaskHandle::new(
            1,
            Arc::new(FnTask::new("phased", |_| Ok(()))),
            SkipPolicy::Persist,
            false,
        );
        assert_eq!(handle.status(), TaskStatus::Queued);

        handle.execute().unwrap();
        assert_eq!(handle.status(), TaskStatus::Completed);
        assert!(handle.is_completed());
    }

    #[test]
    fn panicking_task_still_completes() {
        let handle = TaskHandle::new(
            2,
            Arc::new(FnTask::new("panics", |_| panic!("inside task"))),
            SkipPolicy::Persist,
            false,
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handle.execute()));
        assert!(result.is_err());
        assert!(handle.is_completed());
    }
}
