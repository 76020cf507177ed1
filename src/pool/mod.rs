//! Bounded worker pool engine.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      WorkerPool                            │
//! ├────────────────────────────────────────────────────────────┤
//! │              ┌───────────────┐                             │
//! │              │   submit()    │                             │
//! │              └───────┬───────┘                             │
//! │     core free? ──────┼──── start worker (direct hand-off)  │
//! │     queue room? ─────┼──── enqueue                         │
//! │     below max? ──────┼──── start worker (direct hand-off)  │
//! │     otherwise ───────┴──── rejection policy                │
//! │                                                            │
//! │              ┌───────────────┐                             │
//! │              │ bounded queue │  (mutex + condvar)          │
//! │              └───────┬───────┘                             │
//! │       ┌──────────────┼──────────────┐                      │
//! │  ┌────▼────┐    ┌────▼────┐    ┌────▼────┐                 │
//! │  │ Worker1 │    │ Worker2 │    │ WorkerN │  (core..=max)   │
//! │  └─────────┘    └─────────┘    └─────────┘                 │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Workers above the core count exit after `idle_timeout` without work.

mod builder;
mod error;
mod factory;
mod policy;
mod spec;
mod task;
mod thread;

pub use builder::PoolBuilder;
pub use error::{PoolError, PoolResult};
pub use factory::{DefaultThreadFactory, NamedThreadFactory, ThreadFactory};
pub(crate) use factory::default_thread_factory;
pub use policy::{RejectionHandler, RejectionPolicy, Submission, PRESET_POLICY_NAMES};
pub use spec::{PoolSpec, QueueCapacity};
pub use task::{Task, TaskHandle};
pub use thread::WorkerPool;

pub use tokio_util::sync::CancellationToken;

use serde::Serialize;

/// Pool lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Accepting submissions.
    Running,
    /// Graceful shutdown: draining the queue, accepting nothing.
    Shutdown,
    /// Immediate shutdown: queue abandoned, in-flight tasks finishing.
    Stop,
    /// All workers have exited.
    Terminated,
}

/// Point-in-time view of a pool, for logging and monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub state: RunState,
    /// Live worker threads.
    pub pool_size: usize,
    /// Workers currently running a task.
    pub active: usize,
    /// Workers waiting for a task.
    pub idle: usize,
    /// Most workers ever alive at once.
    pub largest_pool_size: usize,
    pub core_workers: usize,
    pub max_workers: usize,
    /// Tasks waiting in the queue.
    pub queue_depth: usize,
    /// `None` for an unbounded queue.
    pub queue_capacity: Option<usize>,
    /// Submissions made while running.
    pub submitted: u64,
    /// Tasks that ran to completion on a worker.
    pub completed: u64,
    /// Times the rejection policy was invoked.
    pub saturated: u64,
    /// Submissions refused: `Rejected`, `ShutdownRejected` or a failed spawn.
    pub rejected: u64,
    /// Tasks dropped unrun by a discard policy, or by a shutdown that could
    /// not start a worker to drain the queue.
    pub discarded: u64,
    /// Tasks run on the submitting thread by CallerRuns.
    pub caller_runs: u64,
    /// Tasks that panicked on a worker.
    pub panicked: u64,
}
