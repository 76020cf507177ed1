//! Configuration module for bounded_pool.
//!
//! This module provides centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use bounded_pool::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Core workers: {}", config.pool.core_pool_size);
//! println!("Queue size: {}", config.pool.queue_size);
//! ```

mod error;
mod logging;
mod parse;
mod pool;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use pool::{PoolSettings, DEFAULT_QUEUE_SIZE, DEFAULT_TIME_UNIT, ENV_PREFIX};

use std::time::Duration;

use parse::env_parse;

/// Default seconds between status reports from the binary.
pub const DEFAULT_STATUS_INTERVAL_SECS: u64 = 10;

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Worker pool settings.
    pub pool: PoolSettings,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// How often the binary logs and exports pool status (STATUS_INTERVAL, seconds).
    pub status_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pool: PoolSettings::from_env()?,
            logging: LoggingConfig::from_env()?,
            status_interval: status_interval_from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        let pool = &self.pool;

        info!("Configuration loaded:");
        info!("  Enabled: {}", pool.enabled);
        info!(
            "  Workers: core={} max={}",
            pool.core_pool_size, pool.maximum_pool_size
        );
        info!("  Keep-alive: {} {}", pool.keep_alive_time, pool.time_unit);

        if pool.queue_size == 0 {
            info!("  Queue: unbounded");
        } else {
            info!("  Queue capacity: {}", pool.queue_size);
        }

        if let Some(ref name) = pool.reject_strategy {
            info!("  Reject strategy: {}", name);
        }

        if let Some(ref name) = pool.reject_strategy_bean_name {
            info!("  Reject strategy extension: {}", name);
        }

        if let Some(ref name) = pool.thread_factory_bean_name {
            info!("  Thread factory extension: {}", name);
        }

        info!("  Log format: {:?}", self.logging.format);
        info!("  Status interval: {}s", self.status_interval.as_secs());
    }
}

fn status_interval_from_env() -> Result<Duration, ConfigError> {
    let secs = env_parse("STATUS_INTERVAL", DEFAULT_STATUS_INTERVAL_SECS)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: "STATUS_INTERVAL".into(),
            message: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
