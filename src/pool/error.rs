//! Worker pool error types.

use std::fmt;

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool is saturated (all workers busy, queue full) and the
    /// rejection policy refused the task.
    Rejected {
        /// Live worker count at rejection time.
        pool_size: usize,
        /// Queued tasks at rejection time.
        queue_depth: usize,
        /// Queue capacity (`None` = unbounded).
        queue_capacity: Option<usize>,
    },

    /// The pool has begun shutting down and accepts nothing new.
    ShutdownRejected,

    /// A worker thread could not be spawned.
    Spawn(String),

    /// The task was dropped before it produced a result.
    Cancelled,
}

impl PoolError {
    /// Check if this is a saturation rejection.
    pub fn is_rejected(&self) -> bool {
        matches!(self, PoolError::Rejected { .. })
    }

    /// Check if this is a shutdown rejection.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, PoolError::ShutdownRejected)
    }

    /// Get the error message for logging.
    pub fn message(&self) -> &str {
        match self {
            PoolError::Rejected { .. } => "Task rejected",
            PoolError::ShutdownRejected => "Pool shutdown",
            PoolError::Spawn(_) => "Worker spawn failed",
            PoolError::Cancelled => "Task cancelled",
        }
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Rejected {
                pool_size,
                queue_depth,
                queue_capacity,
            } => match queue_capacity {
                Some(capacity) => write!(
                    f,
                    "task rejected: {} workers busy, {}/{} queued",
                    pool_size, queue_depth, capacity
                ),
                None => write!(
                    f,
                    "task rejected: {} workers busy, {} queued",
                    pool_size, queue_depth
                ),
            },
            PoolError::ShutdownRejected => {
                write!(f, "pool has been shut down")
            }
            PoolError::Spawn(msg) => {
                write!(f, "failed to spawn worker thread: {}", msg)
            }
            PoolError::Cancelled => {
                write!(f, "task was dropped before completion")
            }
        }
    }
}

impl std::error::Error for PoolError {}

impl From<std::io::Error> for PoolError {
    fn from(e: std::io::Error) -> Self {
        PoolError::Spawn(e.to_string())
    }
}

/// Result type alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
