//! Thread creation strategies.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread;

/// Creates the OS threads a pool runs its workers on.
///
/// The factory only configures the thread (name, stack size); the pool
/// spawns it and owns the worker loop.
pub trait ThreadFactory: Send + Sync {
    /// Return a builder for the worker with the given pool-unique id.
    fn new_thread(&self, worker_id: usize) -> thread::Builder;
}

impl<F> ThreadFactory for F
where
    F: Fn(usize) -> thread::Builder + Send + Sync,
{
    fn new_thread(&self, worker_id: usize) -> thread::Builder {
        self(worker_id)
    }
}

/// Plain, unnamed worker threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultThreadFactory;

impl ThreadFactory for DefaultThreadFactory {
    fn new_thread(&self, _worker_id: usize) -> thread::Builder {
        thread::Builder::new()
    }
}

/// The process-wide default factory handle.
///
/// Every spec without a named factory shares this one `Arc`, so specs
/// resolved from the same settings compare equal.
pub(crate) fn default_thread_factory() -> Arc<dyn ThreadFactory> {
    static DEFAULT_THREAD_FACTORY: OnceLock<Arc<dyn ThreadFactory>> = OnceLock::new();
    Arc::clone(DEFAULT_THREAD_FACTORY.get_or_init(|| Arc::new(DefaultThreadFactory)))
}

/// Threads named `{prefix}-{worker_id}`.
#[derive(Clone)]
pub struct NamedThreadFactory {
    prefix: String,
    stack_size: Option<usize>,
}

impl NamedThreadFactory {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            stack_size: None,
        }
    }

    /// Set the stack size for every spawned thread.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl ThreadFactory for NamedThreadFactory {
    fn new_thread(&self, worker_id: usize) -> thread::Builder {
        let builder = thread::Builder::new().name(format!("{}-{}", self.prefix, worker_id));
        match self.stack_size {
            Some(size) => builder.stack_size(size),
            None => builder,
        }
    }
}

impl fmt::Debug for NamedThreadFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedThreadFactory")
            .field("prefix", &self.prefix)
            .finish()
    }
}
