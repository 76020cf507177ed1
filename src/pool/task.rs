//! Units of work and result handles.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::error::{PoolError, PoolResult};

/// An opaque unit of work.
///
/// A task runs at most once. The pool never retries it.
pub struct Task {
    inner: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { inner: Box::new(f) }
    }

    /// Run the task on the current thread, consuming it.
    pub fn run(self) {
        (self.inner)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Task")
    }
}

impl<F> From<F> for Task
where
    F: FnOnce() + Send + 'static,
{
    fn from(f: F) -> Self {
        Task::new(f)
    }
}

/// Handle to the result of a task submitted with
/// [`WorkerPool::submit_with_handle`](super::WorkerPool::submit_with_handle).
///
/// Resolves to [`PoolError::Cancelled`] if the task was dropped without
/// running (discarded by a policy, abandoned by `shutdown_now`, or panicked).
/// Can be awaited from async code or joined from a plain thread.
#[derive(Debug)]
pub struct TaskHandle<R> {
    rx: oneshot::Receiver<R>,
}

impl<R> TaskHandle<R> {
    pub(crate) fn new(rx: oneshot::Receiver<R>) -> Self {
        Self { rx }
    }

    /// Block the current thread until the task finishes.
    ///
    /// Must not be called from inside an async runtime; `.await` the handle
    /// there instead.
    pub fn join(self) -> PoolResult<R> {
        self.rx.blocking_recv().map_err(|_| PoolError::Cancelled)
    }
}

impl<R> Future for TaskHandle<R> {
    type Output = PoolResult<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| PoolError::Cancelled))
    }
}

/// Wrap a closure so its return value is delivered to a [`TaskHandle`].
pub(crate) fn with_handle<F, R>(f: F) -> (Task, TaskHandle<R>)
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let task = Task::new(move || {
        // Receiver may be gone; the result is simply unwanted then.
        let _ = tx.send(f());
    });
    (task, TaskHandle::new(rx))
}
