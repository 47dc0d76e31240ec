use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::handle::TaskHandle;
use crate::executor::task::{panic_message, Task};
use crate::executor::worker::Worker;
use crate::scheduler::{GlobalQueue, LocalDeque, Priority};
use crossbeam_channel::bounded;
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Cumulative pool counters, monotonic over the pool's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Tasks that ran to completion (including panicked ones)
    pub completed: u64,
    /// Tasks taken from another worker's deque
    pub stolen: u64,
    /// Tasks accepted by `submit`
    pub submitted: u64,
}

// State shared between the pool front-end and every worker thread.
pub(crate) struct Shared {
    pub(crate) global: GlobalQueue,
    pub(crate) locals: Vec<LocalDeque>,

    pub(crate) stop: AtomicBool,
    pub(crate) immediate_stop: AtomicBool,

    pub(crate) pending: AtomicUsize,
    pub(crate) active: AtomicUsize,
    pub(crate) submitted: AtomicU64,
    pub(crate) completed: AtomicU64,
    pub(crate) stolen: AtomicU64,

    pub(crate) park_timeout: Duration,

    round_robin: AtomicUsize,

    wait_lock: Mutex<()>,
    quiescent: Condvar,
}

impl Shared {
    fn new(num_threads: usize, park_timeout: Duration) -> Self {
        Self {
            global: GlobalQueue::new(),
            locals: (0..num_threads).map(|_| LocalDeque::new()).collect(),
            stop: AtomicBool::new(false),
            immediate_stop: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            stolen: AtomicU64::new(0),
            park_timeout,
            round_robin: AtomicUsize::new(0),
            wait_lock: Mutex::new(()),
            quiescent: Condvar::new(),
        }
    }

    fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire) || self.immediate_stop.load(Ordering::Acquire)
    }

    // Completion hook, bound into every envelope. Runs after the result
    // has been sent into the handle channel.
    fn task_finished(&self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);

        let was_last = self.pending.fetch_sub(1, Ordering::AcqRel) == 1;
        if was_last && self.stop.load(Ordering::Acquire) {
            // release draining workers without waiting out the idle tick
            self.global.notify_all();
        }

        self.notify_quiescent();
    }

    // The lock is taken before notifying so a waiter that has checked
    // `pending` but not yet blocked cannot miss the wake.
    fn notify_quiescent(&self) {
        let _guard = self.wait_lock.lock();
        self.quiescent.notify_all();
    }

    fn wait_quiescent(&self) {
        let mut guard = self.wait_lock.lock();
        while self.pending.load(Ordering::Acquire) > 0 {
            self.quiescent.wait(&mut guard);
        }
    }
}

/// A fixed-size pool of worker threads with three-level task priority,
/// per-worker deques and randomized work stealing.
///
/// High-priority submissions go through a shared priority channel that
/// every worker polls before its own deque; medium and low submissions
/// are spread round-robin across the per-worker deques and migrate
/// between workers by stealing.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    num_threads: usize,
}

impl ThreadPool {
    /// Spawn a pool with exactly `num_threads` workers.
    ///
    /// Fails with a configuration error when `num_threads` is zero; no
    /// thread is spawned in that case.
    pub fn new(num_threads: usize) -> Result<Self> {
        Self::with_config(Config::builder().num_threads(num_threads).build()?)
    }

    /// Spawn a pool from a validated [`Config`].
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let num_threads = config.worker_threads();
        let shared = Arc::new(Shared::new(num_threads, config.park_timeout));

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id, Arc::clone(&shared));
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            match builder.spawn(move || worker.run()) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Unwind the workers spawned so far before failing.
                    shared.stop.store(true, Ordering::Release);
                    shared.global.notify_all();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(Error::executor(format!("failed to spawn worker: {e}")));
                }
            }
        }

        debug!(num_threads, "pool started");

        Ok(Self {
            shared,
            workers: Mutex::new(handles),
            num_threads,
        })
    }

    /// Submit a task at [`Priority::Medium`].
    ///
    /// Returns a [`TaskHandle`] resolving to the callable's return value
    /// or to the panic it raised. Fails with [`Error::PoolStopped`] once
    /// either shutdown has begun; nothing is mutated in that case.
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit_with_priority(Priority::default(), f)
    }

    /// Submit a task at an explicit priority.
    ///
    /// High-priority tasks are routed to the shared priority channel and
    /// overtake queued medium/low work; medium and low tasks land on a
    /// round-robin-chosen worker deque and carry no further distinction
    /// between them.
    pub fn submit_with_priority<F, T>(&self, priority: Priority, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.shared.is_stopping() {
            return Err(Error::PoolStopped);
        }

        let (sender, receiver) = bounded(1);
        let shared = Arc::clone(&self.shared);

        let task = Task::new(move || {
            let outcome = catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
                let message = panic_message(&*payload);
                warn!(cause = %message, "task panicked");
                Error::TaskPanicked(message)
            });
            // The receiver may be gone; completion bookkeeping still runs.
            let _ = sender.send(outcome);
            shared.task_finished();
        });
        let handle = TaskHandle::new(task.id(), receiver);

        // Counters move before the enqueue so a quiescence waiter can
        // never observe pending == 0 with this task in flight.
        self.shared.submitted.fetch_add(1, Ordering::Relaxed);
        self.shared.active.fetch_add(1, Ordering::Relaxed);
        self.shared.pending.fetch_add(1, Ordering::AcqRel);

        match priority {
            Priority::High => self.shared.global.push(priority, task),
            Priority::Medium | Priority::Low => {
                let target =
                    self.shared.round_robin.fetch_add(1, Ordering::Relaxed) % self.num_threads;
                self.shared.locals[target].push(task);
            }
        }

        // Wake one worker even for deque pushes; an idle worker discovers
        // the new task by stealing.
        self.shared.global.notify_one();

        Ok(handle)
    }

    /// Block until every accepted task has completed (`pending == 0`).
    ///
    /// Re-entrant across threads, returns immediately when the pool is
    /// already quiescent, and does not imply shutdown: submissions may
    /// resume afterwards.
    pub fn wait_all(&self) {
        self.shared.wait_quiescent();
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Loose upper bound on in-flight work; tracks the pending gauge.
    pub fn active_tasks(&self) -> usize {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Tasks accepted and not yet completed, including queued ones.
    pub fn pending_tasks(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Snapshot of the cumulative counters.
    pub fn get_stats(&self) -> Stats {
        Stats {
            completed: self.shared.completed.load(Ordering::Relaxed),
            stolen: self.shared.stolen.load(Ordering::Relaxed),
            submitted: self.shared.submitted.load(Ordering::Relaxed),
        }
    }

    /// Drain all queues to completion, then stop the workers.
    ///
    /// Every task accepted before this call returns has run to completion
    /// and its handle is satisfied. Idempotent; a concurrent second caller
    /// blocks until the workers are joined rather than returning early.
    pub fn shutdown_graceful(&self) {
        debug!("graceful shutdown requested");

        self.shared.stop.store(true, Ordering::Release);
        self.shared.global.notify_all();
        self.join_workers();
    }

    /// Stop as soon as possible.
    ///
    /// Each worker exits the first time it finds no task, even while
    /// other tasks are still in flight. Envelopes left in the queues
    /// after the workers are gone (e.g. from submissions racing this
    /// call) are dropped, which cancels their handles
    /// ([`Error::TaskCancelled`]); the pending gauge is reset so
    /// quiescence waiters are released. Idempotent.
    pub fn shutdown_immediate(&self) {
        debug!("immediate shutdown requested");

        self.shared.immediate_stop.store(true, Ordering::Release);
        self.shared.stop.store(true, Ordering::Release);
        self.shared.global.notify_all();
        self.join_workers();

        let mut dropped = self.shared.global.drain();
        for deque in &self.shared.locals {
            dropped += deque.drain();
        }
        debug_assert!(self.shared.global.is_empty());
        debug_assert!(self.shared.locals.iter().all(|d| d.is_empty()));
        if dropped > 0 {
            debug!(dropped, "discarded queued tasks");
        }

        // Dropped envelopes never ran their completion hook; zero the
        // gauges so current and future quiescence waiters are released.
        self.shared.pending.store(0, Ordering::Release);
        self.shared.active.store(0, Ordering::Release);
        self.shared.notify_quiescent();
    }

    fn join_workers(&self) {
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown_graceful();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads)
            .field("pending", &self.pending_tasks())
            .field("stopping", &self.shared.is_stopping())
            .finish()
    }
}
