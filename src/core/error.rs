//! Error types for pool, queue and manager operations.

use thiserror::Error;

/// Errors produced by the thread pool subsystem.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No work arrived before the dequeue deadline.
    #[error("timed out waiting for work")]
    Timeout,
    /// The waiting thread was asked to stop waiting.
    #[error("wait for work was cancelled")]
    Cancelled,
    /// The requested pool is not known to the manager.
    #[error("pool not found: {0}")]
    NotFound(String),
    /// The pool or manager has been closed.
    #[error("closed: {0}")]
    Closed(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type returned by work items; failures are logged, never propagated.
pub type AppResult<T> = Result<T, anyhow::Error>;
