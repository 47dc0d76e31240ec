// worker loop and steal protocol
use crate::executor::pool::Shared;
use crate::executor::task::Task;
use rand::Rng;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::trace;

pub(crate) struct Worker {
    id: usize,
    shared: Arc<Shared>,
}

impl Worker {
    pub(crate) fn new(id: usize, shared: Arc<Shared>) -> Self {
        Self { id, shared }
    }

    // main loop
    pub(crate) fn run(&self) {
        trace!(worker = self.id, "worker started");

        loop {
            if let Some(task) = self.find_task() {
                trace!(worker = self.id, task = ?task.id(), "executing");
                task.run();
                continue;
            }

            // Flags are only consulted once no task was found, so queued
            // work keeps flowing through whichever workers see it.
            if self.shared.immediate_stop.load(Ordering::Acquire) {
                break;
            }

            if self.shared.stop.load(Ordering::Acquire)
                && self.shared.pending.load(Ordering::Acquire) == 0
            {
                break;
            }

            // Local pushes notify the channel once per submission, so a
            // missed wake is recovered on the next tick at the latest.
            let shared = &self.shared;
            shared.global.park(shared.park_timeout, || {
                shared.stop.load(Ordering::Acquire)
                    || shared.immediate_stop.load(Ordering::Acquire)
                    || shared.pending.load(Ordering::Acquire) > 0
            });
        }

        trace!(worker = self.id, "worker exiting");
    }

    // Source order: global channel, own deque, then steal.
    fn find_task(&self) -> Option<Task> {
        if let Some(task) = self.shared.global.pop() {
            return Some(task);
        }

        if let Some(task) = self.shared.locals[self.id].pop() {
            return Some(task);
        }

        self.try_steal()
    }

    // Scan every other deque once, starting at a random victim.
    fn try_steal(&self) -> Option<Task> {
        let n = self.shared.locals.len();
        if n == 1 {
            return None;
        }

        let start = rand::thread_rng().gen_range(0..n);

        for offset in 0..n {
            let victim = (start + offset) % n;
            if victim == self.id {
                continue;
            }

            if let Some(task) = self.shared.locals[victim].steal() {
                self.shared.stolen.fetch_add(1, Ordering::Relaxed);
                trace!(worker = self.id, victim, "stole task");
                return Some(task);
            }
        }

        None
    }
}
