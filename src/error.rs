//! Error types for the stratus pool.

/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the pool and by task handles.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Executor error
    #[error("executor error: {0}")]
    Executor(String),

    /// Submission was refused because the pool is draining or stopped
    #[error("pool is stopped, submission refused")]
    PoolStopped,

    /// The task's callable panicked; the payload message is captured
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// The task was discarded by an immediate shutdown before it ran
    #[error("task cancelled before execution")]
    TaskCancelled,
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an executor error
    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }
}
