//! Task envelope and identity.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A deferred, nullary unit of work.
///
/// The boxed job owns the user callable, its captures, the completion
/// channel sender and the pool bookkeeping hook. An envelope lives in
/// exactly one queue at a time, is moved (never copied) to the worker
/// that runs it, and is consumed by `run`. Captures are released as soon
/// as the job returns, including when the user callable panics.
pub(crate) struct Task {
    id: TaskId,
    job: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    pub(crate) fn new<F>(job: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            job: Box::new(job),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Invoke the job, consuming the envelope.
    pub(crate) fn run(self) {
        (self.job)();
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish()
    }
}

/// Best-effort extraction of a panic payload message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
