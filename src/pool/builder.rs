//! Pool construction.

use crate::config::{ConfigError, PoolSettings};
use crate::registry::ExtensionRegistry;
use crate::resolver;

use super::error::PoolResult;
use super::spec::PoolSpec;
use super::thread::WorkerPool;

const DEFAULT_POOL_NAME: &str = "pool";

/// Builds a [`WorkerPool`] from a resolved [`PoolSpec`].
///
/// ```rust,ignore
/// let pool = PoolBuilder::from_settings(&settings, &registry)?
///     .name("jobs")
///     .prestart_core_workers(true)
///     .build()?;
/// pool.submit(|| println!("hello"))?;
/// ```
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    spec: PoolSpec,
    name: String,
    prestart: bool,
}

impl PoolBuilder {
    pub fn new(spec: PoolSpec) -> Self {
        Self {
            spec,
            name: DEFAULT_POOL_NAME.to_string(),
            prestart: false,
        }
    }

    /// Resolve raw settings against a registry, then build from the result.
    pub fn from_settings(
        settings: &PoolSettings,
        registry: &ExtensionRegistry,
    ) -> Result<Self, ConfigError> {
        resolver::resolve(settings, registry).map(Self::new)
    }

    /// Pool name used in log fields.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Start all core workers during `build` instead of on first use.
    pub fn prestart_core_workers(mut self, prestart: bool) -> Self {
        self.prestart = prestart;
        self
    }

    pub fn spec(&self) -> &PoolSpec {
        &self.spec
    }

    /// Construct the running pool.
    ///
    /// Only fails when prestarting and a worker thread cannot be spawned; the
    /// partially started pool is shut down before returning.
    pub fn build(self) -> PoolResult<WorkerPool> {
        let pool = WorkerPool::new(self.spec, self.name);

        if self.prestart {
            // Dropping `pool` on error shuts it down.
            pool.prestart_core_workers()?;
        }

        Ok(pool)
    }
}
