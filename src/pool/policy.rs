//! Rejection policies and submission outcomes.

use std::fmt;
use std::sync::Arc;

use super::error::PoolResult;
use super::task::Task;
use super::WorkerPool;

/// How a submitted task was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Handed directly to a newly started worker.
    Started,
    /// Placed in the queue.
    Queued,
    /// Executed synchronously on the submitting thread (CallerRuns).
    RanOnCaller,
    /// Dropped without running (DiscardNewest).
    Discarded,
    /// Queued after the oldest queued task was dropped (DiscardOldest).
    QueuedAfterEviction,
    /// Accepted by a custom rejection handler.
    Handled,
}

impl Submission {
    /// Whether the submitted task will run (or already ran).
    pub fn will_run(self) -> bool {
        !matches!(self, Submission::Discarded)
    }
}

/// Custom behavior for a saturated pool.
///
/// Called outside the pool lock with the rejected task and the pool itself,
/// so the handler may inspect [`WorkerPool::status`]. Whatever it returns is
/// handed back to the submitter unchanged.
pub trait RejectionHandler: Send + Sync {
    fn rejected(&self, task: Task, pool: &WorkerPool) -> PoolResult<Submission>;
}

impl<F> RejectionHandler for F
where
    F: Fn(Task, &WorkerPool) -> PoolResult<Submission> + Send + Sync,
{
    fn rejected(&self, task: Task, pool: &WorkerPool) -> PoolResult<Submission> {
        self(task, pool)
    }
}

/// The strategy invoked when a task can be neither queued nor dispatched.
#[derive(Clone, Default)]
pub enum RejectionPolicy {
    /// Run the task on the submitting thread.
    #[default]
    CallerRuns,
    /// Fail the submission with [`PoolError::Rejected`](super::PoolError::Rejected).
    Abort,
    /// Drop the incoming task and report [`Submission::Discarded`].
    DiscardNewest,
    /// Drop the oldest queued task and queue the incoming one.
    DiscardOldest,
    /// Delegate to an external handler.
    Custom(Arc<dyn RejectionHandler>),
}

/// Preset policy names accepted in configuration.
pub const PRESET_POLICY_NAMES: [&str; 4] = [
    "CallerRunsPolicy",
    "AbortPolicy",
    "DiscardPolicy",
    "DiscardOldestPolicy",
];

impl RejectionPolicy {
    /// Look up a preset policy by its configuration name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "CallerRunsPolicy" => Some(RejectionPolicy::CallerRuns),
            "AbortPolicy" => Some(RejectionPolicy::Abort),
            "DiscardPolicy" => Some(RejectionPolicy::DiscardNewest),
            "DiscardOldestPolicy" => Some(RejectionPolicy::DiscardOldest),
            _ => None,
        }
    }

    /// Wrap a custom handler.
    pub fn custom(handler: impl RejectionHandler + 'static) -> Self {
        RejectionPolicy::Custom(Arc::new(handler))
    }

    /// Name for logging: the preset name, or `"Custom"`.
    pub fn name(&self) -> &'static str {
        match self {
            RejectionPolicy::CallerRuns => "CallerRunsPolicy",
            RejectionPolicy::Abort => "AbortPolicy",
            RejectionPolicy::DiscardNewest => "DiscardPolicy",
            RejectionPolicy::DiscardOldest => "DiscardOldestPolicy",
            RejectionPolicy::Custom(_) => "Custom",
        }
    }
}

// Custom handlers compare by identity.
impl PartialEq for RejectionPolicy {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RejectionPolicy::Custom(a), RejectionPolicy::Custom(b)) => Arc::ptr_eq(a, b),
            (RejectionPolicy::Custom(_), _) | (_, RejectionPolicy::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Debug for RejectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
