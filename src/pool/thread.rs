//! Worker pool engine.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::error::{PoolError, PoolResult};
use super::policy::{RejectionPolicy, Submission};
use super::spec::PoolSpec;
use super::task::{with_handle, Task, TaskHandle};
use super::{PoolStatus, RunState};

/// First-task slot shared between a spawner and its new worker.
type Handoff = Mutex<Option<Task>>;

/// State guarded by the pool mutex.
struct State {
    queue: VecDeque<Task>,
    /// Live worker threads.
    workers: usize,
    /// Workers parked waiting for a task.
    idle: usize,
    largest: usize,
    next_worker_id: usize,
    run_state: RunState,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    saturated: AtomicU64,
    rejected: AtomicU64,
    discarded: AtomicU64,
    caller_runs: AtomicU64,
    panicked: AtomicU64,
}

impl Counters {
    #[inline]
    fn bump(counter: &AtomicU64) {
        Self::add(counter, 1);
    }

    #[inline]
    fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

struct Shared {
    name: String,
    spec: PoolSpec,
    state: Mutex<State>,
    /// Signalled when a task is queued or the run state changes.
    work_available: Condvar,
    /// Signalled once the pool reaches `Terminated`.
    terminated: Condvar,
    /// Workers currently running a task.
    active: AtomicUsize,
    counters: Counters,
    cancel: CancellationToken,
}

/// A bounded worker pool with policy-driven admission control.
///
/// Workers are started lazily: the pool holds no threads until the first
/// submission (or [`prestart_core_workers`](Self::prestart_core_workers)).
/// Admission never blocks on a full queue; only the CallerRuns policy makes
/// `submit` run work on the calling thread.
///
/// Dropping the pool starts a graceful shutdown without waiting for it.
pub struct WorkerPool {
    shared: Arc<Shared>,
}

impl WorkerPool {
    pub(crate) fn new(spec: PoolSpec, name: String) -> Self {
        tracing::info!(
            pool = %name,
            core = spec.core_workers(),
            max = spec.max_workers(),
            capacity = %spec.queue_capacity(),
            idle_timeout_ms = spec.idle_timeout().as_millis() as u64,
            policy = spec.rejection_policy().name(),
            "worker pool created"
        );

        let shared = Shared {
            name,
            spec,
            state: Mutex::new(State {
                queue: VecDeque::new(),
                workers: 0,
                idle: 0,
                largest: 0,
                next_worker_id: 0,
                run_state: RunState::Running,
            }),
            work_available: Condvar::new(),
            terminated: Condvar::new(),
            active: AtomicUsize::new(0),
            counters: Counters::default(),
            cancel: CancellationToken::new(),
        };

        Self {
            shared: Arc::new(shared),
        }
    }

    /// Submit a closure. See [`submit_task`](Self::submit_task).
    pub fn submit<F>(&self, f: F) -> PoolResult<Submission>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_task(Task::new(f))
    }

    /// Submit a closure and get a handle to its return value.
    ///
    /// If a discard policy drops the task the handle resolves to
    /// [`PoolError::Cancelled`].
    pub fn submit_with_handle<F, R>(&self, f: F) -> PoolResult<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (task, handle) = with_handle(f);
        self.submit_task(task)?;
        Ok(handle)
    }

    /// Admit a task: start a core worker, else queue, else grow to max,
    /// else apply the rejection policy.
    ///
    /// Once shutdown has begun every submission fails with
    /// [`PoolError::ShutdownRejected`], whatever the policy.
    pub fn submit_task(&self, task: Task) -> PoolResult<Submission> {
        let shared = &self.shared;
        let spec = &shared.spec;
        let mut state = shared.lock();

        if state.run_state != RunState::Running {
            drop(state);
            Counters::bump(&shared.counters.rejected);
            return Err(PoolError::ShutdownRejected);
        }
        Counters::bump(&shared.counters.submitted);

        let task = if state.workers < spec.core_workers() {
            match shared.start_with(&mut state, task) {
                Ok(()) => return Ok(Submission::Started),
                Err(task) => task,
            }
        } else {
            task
        };

        if spec.queue_capacity().has_room(state.queue.len()) {
            state.queue.push_back(task);
            if state.workers == 0 {
                // core = 0, or the core spawn above failed: someone has to
                // drain the queue.
                if let Err(e) = shared.spawn_worker(&mut state) {
                    let unrunnable = state.queue.pop_back();
                    drop(state);
                    drop(unrunnable);
                    Counters::bump(&shared.counters.rejected);
                    return Err(e.into());
                }
            }
            drop(state);
            shared.work_available.notify_one();
            return Ok(Submission::Queued);
        }

        let task = if state.workers < spec.max_workers() {
            match shared.start_with(&mut state, task) {
                Ok(()) => return Ok(Submission::Started),
                Err(task) => task,
            }
        } else {
            task
        };

        let pool_size = state.workers;
        let queue_depth = state.queue.len();
        drop(state);

        self.reject(task, pool_size, queue_depth)
    }

    /// Dispatch the configured rejection policy. Called without the lock held.
    ///
    /// A shutdown that began after admission released the lock wins over
    /// every policy. A custom handler can still observe a shutdown that
    /// starts while it is running.
    fn reject(&self, task: Task, pool_size: usize, queue_depth: usize) -> PoolResult<Submission> {
        let shared = &self.shared;
        let counters = &shared.counters;
        let policy = shared.spec.rejection_policy();

        if self.is_shutdown() {
            Counters::bump(&counters.rejected);
            return Err(PoolError::ShutdownRejected);
        }

        Counters::bump(&counters.saturated);
        tracing::debug!(
            pool = %shared.name,
            policy = policy.name(),
            workers = pool_size,
            queued = queue_depth,
            "pool saturated"
        );

        match policy {
            RejectionPolicy::CallerRuns => {
                Counters::bump(&counters.caller_runs);
                task.run();
                Ok(Submission::RanOnCaller)
            }
            RejectionPolicy::Abort => {
                Counters::bump(&counters.rejected);
                Err(shared.rejected_error(pool_size, queue_depth))
            }
            RejectionPolicy::DiscardNewest => {
                Counters::bump(&counters.discarded);
                drop(task);
                Ok(Submission::Discarded)
            }
            RejectionPolicy::DiscardOldest => {
                let mut state = shared.lock();
                // Eviction and the state check share one critical section.
                if state.run_state != RunState::Running {
                    drop(state);
                    Counters::bump(&counters.rejected);
                    return Err(PoolError::ShutdownRejected);
                }
                let Some(oldest) = state.queue.pop_front() else {
                    // Nothing to evict.
                    let queue_depth = state.queue.len();
                    drop(state);
                    Counters::bump(&counters.rejected);
                    return Err(shared.rejected_error(pool_size, queue_depth));
                };
                state.queue.push_back(task);
                drop(state);
                shared.work_available.notify_one();

                Counters::bump(&counters.discarded);
                // Dropped outside the lock: a task's captures may do work on drop.
                drop(oldest);
                Ok(Submission::QueuedAfterEviction)
            }
            RejectionPolicy::Custom(handler) => handler.rejected(task, self),
        }
    }

    /// Start every core worker now instead of on demand.
    ///
    /// Returns the number of workers started.
    pub fn prestart_core_workers(&self) -> PoolResult<usize> {
        let shared = &self.shared;
        let mut state = shared.lock();
        let mut started = 0;

        while state.run_state == RunState::Running && state.workers < shared.spec.core_workers() {
            shared.spawn_worker(&mut state)?;
            started += 1;
        }

        Ok(started)
    }

    /// Graceful shutdown: stop accepting tasks, run everything already queued,
    /// then let the workers exit. Does not wait; see
    /// [`await_termination`](Self::await_termination).
    pub fn shutdown(&self) {
        let shared = &self.shared;
        let mut state = shared.lock();

        if state.run_state == RunState::Running {
            state.run_state = RunState::Shutdown;
            tracing::info!(
                pool = %shared.name,
                queued = state.queue.len(),
                workers = state.workers,
                "shutting down worker pool"
            );
        }

        if state.workers == 0
            && !state.queue.is_empty()
            && shared.spawn_worker(&mut state).is_err()
        {
            let lost = state.queue.len();
            state.queue.clear();
            Counters::add(&shared.counters.discarded, lost as u64);
            tracing::error!(
                pool = %shared.name,
                lost,
                "no worker could be started to drain the queue; dropping queued tasks"
            );
        }

        shared.try_terminate(&mut state);
        drop(state);
        shared.work_available.notify_all();
    }

    /// Immediate shutdown: stop accepting tasks, abandon the queue and cancel
    /// the pool's [`CancellationToken`]. In-flight tasks are not interrupted;
    /// they should watch the token and return early.
    ///
    /// Returns the queued tasks that will never run.
    pub fn shutdown_now(&self) -> Vec<Task> {
        let shared = &self.shared;
        let mut state = shared.lock();

        if state.run_state < RunState::Stop {
            state.run_state = RunState::Stop;
        }
        let abandoned: Vec<Task> = state.queue.drain(..).collect();
        shared.cancel.cancel();
        shared.try_terminate(&mut state);
        let workers = state.workers;
        drop(state);
        shared.work_available.notify_all();

        tracing::info!(
            pool = %shared.name,
            abandoned = abandoned.len(),
            workers,
            "worker pool stopped"
        );

        abandoned
    }

    /// Graceful or immediate shutdown in one call.
    pub fn stop(&self, graceful: bool) -> Vec<Task> {
        if graceful {
            self.shutdown();
            Vec::new()
        } else {
            self.shutdown_now()
        }
    }

    /// Block until every worker has exited after a shutdown, or `timeout`
    /// elapses. Returns whether the pool terminated.
    ///
    /// Must not be called from a task running on this pool.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let shared = &self.shared;
        let deadline = Instant::now() + timeout;
        let mut state = shared.lock();

        while state.run_state != RunState::Terminated {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            state = shared
                .terminated
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        true
    }

    /// Whether shutdown (graceful or immediate) has begun.
    pub fn is_shutdown(&self) -> bool {
        self.shared.lock().run_state != RunState::Running
    }

    /// Whether all workers have exited after shutdown.
    pub fn is_terminated(&self) -> bool {
        self.shared.lock().run_state == RunState::Terminated
    }

    /// Token cancelled by [`shutdown_now`](Self::shutdown_now).
    ///
    /// Long-running tasks clone it and check `is_cancelled()` at their own
    /// checkpoints.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    /// The resolved specification this pool was built from.
    pub fn spec(&self) -> &PoolSpec {
        &self.shared.spec
    }

    /// Get the pool name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Snapshot of worker, queue and counter state.
    pub fn status(&self) -> PoolStatus {
        let shared = &self.shared;
        let counters = &shared.counters;
        let state = shared.lock();

        PoolStatus {
            state: state.run_state,
            pool_size: state.workers,
            active: shared.active.load(Ordering::SeqCst),
            idle: state.idle,
            largest_pool_size: state.largest,
            core_workers: shared.spec.core_workers(),
            max_workers: shared.spec.max_workers(),
            queue_depth: state.queue.len(),
            queue_capacity: shared.spec.queue_capacity().limit(),
            submitted: counters.submitted.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            saturated: counters.saturated.load(Ordering::Relaxed),
            rejected: counters.rejected.load(Ordering::Relaxed),
            discarded: counters.discarded.load(Ordering::Relaxed),
            caller_runs: counters.caller_runs.load(Ordering::Relaxed),
            panicked: counters.panicked.load(Ordering::Relaxed),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.shared.name)
            .field("spec", &self.shared.spec)
            .finish()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Tasks never run under the lock, so poisoning can only come from
        // a bug in the pool itself; the state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rejected_error(&self, pool_size: usize, queue_depth: usize) -> PoolError {
        PoolError::Rejected {
            pool_size,
            queue_depth,
            queue_capacity: self.spec.queue_capacity().limit(),
        }
    }

    /// Start a worker whose first task is `task`. On failure the task is
    /// handed back untouched.
    fn start_with(self: &Arc<Self>, state: &mut State, task: Task) -> Result<(), Task> {
        match self.spawn_worker(state) {
            Ok(handoff) => {
                *handoff.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
                Ok(())
            }
            Err(_) => Err(task),
        }
    }

    /// Spawn a worker thread and register it. The returned slot is read by the
    /// worker only after it acquires the pool lock, which the caller holds, so
    /// a first task placed there before unlocking is always seen.
    fn spawn_worker(self: &Arc<Self>, state: &mut State) -> io::Result<Arc<Handoff>> {
        let id = state.next_worker_id;
        state.next_worker_id += 1;

        let handoff: Arc<Handoff> = Arc::new(Mutex::new(None));
        let worker_handoff = Arc::clone(&handoff);
        let shared = Arc::clone(self);

        // Workers are detached; termination is tracked through `State::workers`.
        let spawned = self.spec.thread_factory().new_thread(id).spawn(move || {
            let first = {
                let _state = shared.lock();
                worker_handoff
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take()
            };
            shared.worker_loop(id, first);
        });

        match spawned {
            Ok(_detached) => {
                state.workers += 1;
                state.largest = state.largest.max(state.workers);
                Ok(handoff)
            }
            Err(e) => {
                tracing::warn!(pool = %self.name, worker = id, error = %e, "failed to spawn worker");
                Err(e)
            }
        }
    }

    /// Worker thread main loop.
    fn worker_loop(&self, id: usize, first: Option<Task>) {
        tracing::debug!(pool = %self.name, worker = id, "worker started");

        let mut next = first;
        while let Some(task) = next.take().or_else(|| self.next_task(id)) {
            self.run_task(id, task);
        }

        tracing::debug!(pool = %self.name, worker = id, "worker stopped");
    }

    fn run_task(&self, id: usize, task: Task) {
        self.active.fetch_add(1, Ordering::SeqCst);
        let result = panic::catch_unwind(AssertUnwindSafe(|| task.run()));
        self.active.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(()) => Counters::bump(&self.counters.completed),
            Err(payload) => {
                Counters::bump(&self.counters.panicked);
                tracing::error!(
                    pool = %self.name,
                    worker = id,
                    panic = panic_message(payload.as_ref()),
                    "task panicked"
                );
            }
        }
    }

    /// Block for the next queued task. `None` means the worker must exit;
    /// the worker has already been deregistered in that case.
    fn next_task(&self, id: usize) -> Option<Task> {
        let core = self.spec.core_workers();
        let idle_timeout = self.spec.idle_timeout();
        let mut state = self.lock();
        let mut timed_out = false;

        loop {
            match state.run_state {
                RunState::Stop | RunState::Terminated => return self.exit_worker(&mut state),
                RunState::Shutdown if state.queue.is_empty() => {
                    return self.exit_worker(&mut state)
                }
                _ => {}
            }

            let timed = state.workers > core;
            if timed && timed_out && (state.workers > 1 || state.queue.is_empty()) {
                tracing::debug!(pool = %self.name, worker = id, "idle worker retiring");
                return self.exit_worker(&mut state);
            }

            if let Some(task) = state.queue.pop_front() {
                return Some(task);
            }

            state.idle += 1;
            if timed {
                let (guard, wait) = self
                    .work_available
                    .wait_timeout(state, idle_timeout)
                    .unwrap_or_else(PoisonError::into_inner);
                state = guard;
                timed_out = wait.timed_out();
            } else {
                state = self
                    .work_available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            state.idle -= 1;
        }
    }

    fn exit_worker(&self, state: &mut State) -> Option<Task> {
        state.workers -= 1;
        self.try_terminate(state);
        None
    }

    /// Move to `Terminated` once shut down with no workers and nothing left to run.
    fn try_terminate(&self, state: &mut State) {
        let drained = match state.run_state {
            RunState::Stop => true,
            RunState::Shutdown => state.queue.is_empty(),
            RunState::Running | RunState::Terminated => false,
        };

        if drained && state.workers == 0 {
            state.run_state = RunState::Terminated;
            self.terminated.notify_all();
            tracing::info!(pool = %self.name, "worker pool terminated");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
