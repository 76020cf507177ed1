//! Resolved pool specification.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ConfigError;

use super::factory::{default_thread_factory, ThreadFactory};
use super::policy::RejectionPolicy;

/// Capacity of the pending-task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCapacity {
    /// At most `n` queued tasks.
    Bounded(usize),
    /// Never full. The pool does not grow past core and only rejects on shutdown.
    Unbounded,
}

impl QueueCapacity {
    /// `0` means unbounded.
    pub fn from_size(size: usize) -> Self {
        if size == 0 {
            QueueCapacity::Unbounded
        } else {
            QueueCapacity::Bounded(size)
        }
    }

    /// Bound as an option (`None` = unbounded).
    pub fn limit(self) -> Option<usize> {
        match self {
            QueueCapacity::Bounded(n) => Some(n),
            QueueCapacity::Unbounded => None,
        }
    }

    #[inline]
    pub(crate) fn has_room(self, len: usize) -> bool {
        match self {
            QueueCapacity::Bounded(n) => len < n,
            QueueCapacity::Unbounded => true,
        }
    }
}

impl fmt::Display for QueueCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueCapacity::Bounded(n) => write!(f, "{}", n),
            QueueCapacity::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Fully resolved, immutable pool parameters.
///
/// Invariant: `max_workers >= core_workers` and `max_workers >= 1`.
#[derive(Clone)]
pub struct PoolSpec {
    core_workers: usize,
    max_workers: usize,
    idle_timeout: Duration,
    queue_capacity: QueueCapacity,
    rejection_policy: RejectionPolicy,
    thread_factory: Arc<dyn ThreadFactory>,
}

impl PoolSpec {
    /// Create a spec with the given worker bounds and defaults for the rest:
    /// zero idle timeout, bounded queue of 10000, CallerRuns, unnamed threads.
    pub fn new(core_workers: usize, max_workers: usize) -> Result<Self, ConfigError> {
        if max_workers == 0 {
            return Err(ConfigError::Invalid {
                key: "maximumPoolSize".into(),
                message: "must be at least 1".into(),
            });
        }
        if max_workers < core_workers {
            return Err(ConfigError::Invalid {
                key: "maximumPoolSize".into(),
                message: format!(
                    "{} is less than corePoolSize {}",
                    max_workers, core_workers
                ),
            });
        }

        Ok(Self {
            core_workers,
            max_workers,
            idle_timeout: Duration::ZERO,
            queue_capacity: QueueCapacity::Bounded(crate::config::DEFAULT_QUEUE_SIZE),
            rejection_policy: RejectionPolicy::default(),
            thread_factory: default_thread_factory(),
        })
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: QueueCapacity) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_rejection_policy(mut self, policy: RejectionPolicy) -> Self {
        self.rejection_policy = policy;
        self
    }

    pub fn with_thread_factory(mut self, factory: Arc<dyn ThreadFactory>) -> Self {
        self.thread_factory = factory;
        self
    }

    #[inline]
    pub fn core_workers(&self) -> usize {
        self.core_workers
    }

    #[inline]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    #[inline]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    #[inline]
    pub fn queue_capacity(&self) -> QueueCapacity {
        self.queue_capacity
    }

    #[inline]
    pub fn rejection_policy(&self) -> &RejectionPolicy {
        &self.rejection_policy
    }

    #[inline]
    pub fn thread_factory(&self) -> &Arc<dyn ThreadFactory> {
        &self.thread_factory
    }
}

// Extension handles compare by identity.
impl PartialEq for PoolSpec {
    fn eq(&self, other: &Self) -> bool {
        self.core_workers == other.core_workers
            && self.max_workers == other.max_workers
            && self.idle_timeout == other.idle_timeout
            && self.queue_capacity == other.queue_capacity
            && self.rejection_policy == other.rejection_policy
            && std::ptr::addr_eq(
                Arc::as_ptr(&self.thread_factory),
                Arc::as_ptr(&other.thread_factory),
            )
    }
}

impl fmt::Debug for PoolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolSpec")
            .field("core_workers", &self.core_workers)
            .field("max_workers", &self.max_workers)
            .field("idle_timeout", &self.idle_timeout)
            .field("queue_capacity", &self.queue_capacity)
            .field("rejection_policy", &self.rejection_policy)
            .finish_non_exhaustive()
    }
}
