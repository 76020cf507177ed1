//! bounded_pool - Configurable bounded worker pools with admission control.
//!
//! This crate turns a handful of declarative settings (worker counts, queue
//! size, keep-alive, rejection policy, thread naming) into a running pool of
//! worker threads that drain one bounded FIFO queue.
//!
//! # Features
//!
//! - **Admission control**: direct hand-off to core workers, then the queue,
//!   then growth up to the maximum, then the rejection policy
//! - **Rejection policies**: CallerRuns, Abort, Discard, DiscardOldest, or a
//!   custom handler looked up by name
//! - **Environment configuration**: `THREAD_POOL_*` variables
//! - **Graceful and immediate shutdown** with cooperative cancellation
//! - **Observability**: status snapshots, structured logging, Prometheus gauges
//!
//! # Example
//!
//! ```rust,ignore
//! use bounded_pool::{autoconfigure, Config, ExtensionRegistry};
//!
//! let config = Config::from_env()?;
//! let registry = ExtensionRegistry::new();
//!
//! if let Some(pool) = autoconfigure(&config.pool, &registry)? {
//!     pool.submit(|| println!("hello from a worker"))?;
//!     pool.shutdown();
//! }
//! ```

use std::fmt;

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod registry;
pub mod resolver;

// Re-exports for convenience
pub use config::{Config, ConfigError, PoolSettings};
pub use pool::{
    PoolBuilder, PoolError, PoolSpec, PoolStatus, RejectionPolicy, Submission, WorkerPool,
};
pub use registry::ExtensionRegistry;

/// Errors surfaced to the host while bringing a pool up.
#[derive(Debug)]
pub enum Error {
    /// Settings could not be resolved.
    Config(ConfigError),
    /// The pool could not be started.
    Pool(PoolError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "invalid configuration: {}", e),
            Error::Pool(e) => write!(f, "pool error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Pool(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<PoolError> for Error {
    fn from(e: PoolError) -> Self {
        Error::Pool(e)
    }
}

/// Build a pool from settings unless they disable it.
///
/// Returns `Ok(None)` when `settings.enabled` is false; the registry is not
/// consulted in that case.
pub fn autoconfigure(
    settings: &PoolSettings,
    registry: &ExtensionRegistry,
) -> Result<Option<WorkerPool>, Error> {
    if !settings.enabled {
        tracing::info!("worker pool disabled by configuration");
        return Ok(None);
    }

    let pool = PoolBuilder::from_settings(settings, registry)?.build()?;
    tracing::info!(status = ?pool.status(), "worker pool configured");
    Ok(Some(pool))
}
