//! Raw worker pool settings.
//!
//! These are the declarative options a host supplies before resolution.
//! Nothing here is validated beyond number parsing; see [`crate::resolver`]
//! for the rules that turn settings into a [`crate::PoolSpec`].

use super::parse::{env_bool, env_opt, env_or, env_parse};
use super::ConfigError;

/// Environment variable prefix for every pool option.
pub const ENV_PREFIX: &str = "THREAD_POOL_";

/// Default bounded queue capacity.
pub const DEFAULT_QUEUE_SIZE: usize = 10_000;

/// Default time unit for `keep_alive_time`.
pub const DEFAULT_TIME_UNIT: &str = "milliseconds";

/// Unvalidated pool settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSettings {
    /// Whether the host should construct the pool at all.
    pub enabled: bool,
    /// Baseline worker count.
    pub core_pool_size: usize,
    /// Ceiling worker count.
    pub maximum_pool_size: usize,
    /// Idle time before a worker above core exits, in `time_unit`.
    pub keep_alive_time: u64,
    /// Unit name for `keep_alive_time`.
    pub time_unit: String,
    /// Bounded queue capacity (0 = unbounded).
    pub queue_size: usize,
    /// Preset rejection policy name.
    pub reject_strategy: Option<String>,
    /// Registry key of a custom rejection handler.
    pub reject_strategy_bean_name: Option<String>,
    /// Registry key of a custom thread factory.
    pub thread_factory_bean_name: Option<String>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        let cpus = num_cpus::get();
        Self {
            enabled: true,
            core_pool_size: cpus,
            maximum_pool_size: cpus,
            keep_alive_time: 0,
            time_unit: DEFAULT_TIME_UNIT.to_string(),
            queue_size: DEFAULT_QUEUE_SIZE,
            reject_strategy: None,
            reject_strategy_bean_name: None,
            thread_factory_bean_name: None,
        }
    }
}

impl PoolSettings {
    /// Load settings from `THREAD_POOL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            enabled: env_bool(&key("ENABLED"), defaults.enabled),
            core_pool_size: env_parse(&key("CORE_POOL_SIZE"), defaults.core_pool_size)?,
            maximum_pool_size: env_parse(&key("MAXIMUM_POOL_SIZE"), defaults.maximum_pool_size)?,
            keep_alive_time: env_parse(&key("KEEP_ALIVE_TIME"), defaults.keep_alive_time)?,
            time_unit: env_or(&key("TIME_UNIT"), DEFAULT_TIME_UNIT),
            queue_size: env_parse(&key("QUEUE_SIZE"), defaults.queue_size)?,
            reject_strategy: env_opt(&key("REJECT_STRATEGY")),
            reject_strategy_bean_name: env_opt(&key("REJECT_STRATEGY_BEAN_NAME")),
            thread_factory_bean_name: env_opt(&key("THREAD_FACTORY_BEAN_NAME")),
        })
    }

    /// Set both core and maximum worker counts.
    pub fn with_workers(mut self, core: usize, max: usize) -> Self {
        self.core_pool_size = core;
        self.maximum_pool_size = max;
        self
    }

    /// Set the keep-alive time and its unit name.
    pub fn with_keep_alive(mut self, time: u64, unit: impl Into<String>) -> Self {
        self.keep_alive_time = time;
        self.time_unit = unit.into();
        self
    }

    /// Set the queue capacity.
    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    /// Set a preset rejection policy by name.
    pub fn with_reject_strategy(mut self, name: impl Into<String>) -> Self {
        self.reject_strategy = Some(name.into());
        self
    }

    /// Use a custom rejection handler registered under `name`.
    pub fn with_reject_strategy_bean(mut self, name: impl Into<String>) -> Self {
        self.reject_strategy_bean_name = Some(name.into());
        self
    }

    /// Use a custom thread factory registered under `name`.
    pub fn with_thread_factory_bean(mut self, name: impl Into<String>) -> Self {
        self.thread_factory_bean_name = Some(name.into());
        self
    }

    /// Enable or disable pool construction.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

fn key(name: &str) -> String {
    format!("{}{}", ENV_PREFIX, name)
}
