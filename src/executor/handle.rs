//! Caller-facing result handles.

use crate::error::{Error, Result};
use crate::executor::task::TaskId;
use crossbeam_channel::{Receiver, TryRecvError};

/// Owning handle to a submitted task's eventual result.
///
/// The handle resolves exactly once: to the callable's return value, to
/// [`Error::TaskPanicked`] carrying the captured panic message, or to
/// [`Error::TaskCancelled`] when the envelope was discarded by an
/// immediate shutdown before it ran. Cancellation is deliberate: a handle
/// for a dropped task fails fast instead of blocking forever.
pub struct TaskHandle<T> {
    id: TaskId,
    result: Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(id: TaskId, result: Receiver<Result<T>>) -> Self {
        Self { id, result }
    }

    /// Identifier of the underlying task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Block until the task resolves.
    pub fn join(self) -> Result<T> {
        match self.result.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::TaskCancelled),
        }
    }

    /// Poll without blocking. `Ok(None)` means the task is still in flight.
    pub fn try_join(&self) -> Result<Option<T>> {
        match self.result.try_recv() {
            Ok(outcome) => outcome.map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::TaskCancelled),
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn handle_pair<T>() -> (crossbeam_channel::Sender<Result<T>>, TaskHandle<T>) {
        let (sender, receiver) = bounded(1);
        let task = crate::executor::task::Task::new(|| {});
        (sender, TaskHandle::new(task.id(), receiver))
    }

    #[test]
    fn test_join_returns_value() {
        let (sender, handle) = handle_pair();
        sender.send(Ok(7)).unwrap();
        assert_eq!(handle.join().unwrap(), 7);
    }

    #[test]
    fn test_try_join_pending_then_ready() {
        let (sender, handle) = handle_pair();

        assert!(matches!(handle.try_join(), Ok(None)));
        sender.send(Ok(3)).unwrap();
        assert!(matches!(handle.try_join(), Ok(Some(3))));
    }

    #[test]
    fn test_dropped_sender_means_cancelled() {
        let (sender, handle) = handle_pair::<i32>();
        drop(sender);
        assert!(matches!(handle.join(), Err(Error::TaskCancelled)));
    }
}
