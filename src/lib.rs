//! STRATUS - a fixed-size work-stealing thread pool with layered priority
//!
//! A pool of worker threads that accepts short units of work from any
//! thread and runs them to completion. Each submission returns a handle
//! resolving to the task's result or its captured panic. Scheduling is
//! layered: high-priority tasks flow through a shared priority channel
//! that every worker polls first, while medium and low tasks are spread
//! round-robin across per-worker deques and rebalanced by randomized
//! stealing.
//!
//! # Quick Start
//!
//! ```no_run
//! use stratus::{Priority, ThreadPool};
//!
//! let pool = ThreadPool::new(4).unwrap();
//!
//! let handle = pool.submit(|| 2 + 2).unwrap();
//! assert_eq!(handle.join().unwrap(), 4);
//!
//! let urgent = pool.submit_with_priority(Priority::High, || "now").unwrap();
//! assert_eq!(urgent.join().unwrap(), "now");
//!
//! pool.wait_all();
//! pool.shutdown_graceful();
//! ```
//!
//! # Features
//!
//! - **Three-level priority**: `High` overtakes queued `Medium`/`Low` work
//! - **Work stealing**: idle workers take from the back of busy deques
//! - **Result handles**: block or poll for each task's value or panic
//! - **Bulk quiescence**: `wait_all` blocks until every accepted task ran
//! - **Two shutdown modes**: graceful draining or immediate discard
//! - **Live counters**: pending/active gauges plus cumulative statistics
//!
//! # Shutdown semantics
//!
//! `shutdown_graceful` completes all accepted work before returning.
//! `shutdown_immediate` stops each worker the first time it runs out of
//! work and discards whatever is still queued once the workers are gone;
//! a discarded task's handle is cancelled, so joining it returns
//! [`Error::TaskCancelled`] rather than blocking forever.

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod scheduler;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{Stats, TaskHandle, TaskId, ThreadPool};
pub use scheduler::Priority;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_and_join() {
        let pool = ThreadPool::new(2).unwrap();

        let handle = pool.submit(|| 21 * 2).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn test_priority_submission() {
        let pool = ThreadPool::new(2).unwrap();

        let high = pool.submit_with_priority(Priority::High, || 1).unwrap();
        let low = pool.submit_with_priority(Priority::Low, || 2).unwrap();

        assert_eq!(high.join().unwrap(), 1);
        assert_eq!(low.join().unwrap(), 2);
    }

    #[test]
    fn test_stats_track_submissions() {
        let pool = ThreadPool::new(2).unwrap();

        for _ in 0..10 {
            pool.submit(|| {}).unwrap();
        }
        pool.wait_all();

        let stats = pool.get_stats();
        assert_eq!(stats.submitted, 10);
        assert_eq!(stats.completed, 10);
        assert!(stats.stolen <= stats.completed);
    }
}
