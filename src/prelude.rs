//! Convenience re-exports for common usage.

pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{Stats, TaskHandle, TaskId, ThreadPool};
pub use crate::scheduler::Priority;
