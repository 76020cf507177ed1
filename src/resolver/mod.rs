//! Settings resolution.
//!
//! Turns raw [`PoolSettings`] into a [`PoolSpec`]: checks every enumerated
//! value against its constant table, validates worker bounds, and resolves
//! named extensions through the [`ExtensionRegistry`]. After this step no
//! further lookups happen; the spec is self-contained.
//!
//! Resolution is a pure function of the settings and the registry contents:
//! resolving the same input twice yields equal specs.

mod time_unit;

pub use time_unit::{TimeUnit, TIME_UNITS};

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigError, PoolSettings};
use crate::pool::{
    default_thread_factory, PoolSpec, QueueCapacity, RejectionPolicy, ThreadFactory,
    PRESET_POLICY_NAMES,
};
use crate::registry::ExtensionRegistry;

/// Resolve settings into a pool specification.
pub fn resolve(
    settings: &PoolSettings,
    registry: &ExtensionRegistry,
) -> Result<PoolSpec, ConfigError> {
    let idle_timeout = resolve_idle_timeout(settings)?;
    let thread_factory = resolve_thread_factory(settings, registry)?;
    let rejection_policy = resolve_rejection_policy(settings, registry)?;

    let spec = PoolSpec::new(settings.core_pool_size, settings.maximum_pool_size)?
        .with_idle_timeout(idle_timeout)
        .with_queue_capacity(QueueCapacity::from_size(settings.queue_size))
        .with_rejection_policy(rejection_policy)
        .with_thread_factory(thread_factory);

    tracing::debug!(?spec, "pool settings resolved");
    Ok(spec)
}

fn resolve_idle_timeout(settings: &PoolSettings) -> Result<Duration, ConfigError> {
    let unit = TimeUnit::from_name(&settings.time_unit).ok_or_else(|| ConfigError::Invalid {
        key: "timeUnit".into(),
        message: format!(
            "'{}', expected one of: {}",
            settings.time_unit,
            TimeUnit::allowed()
        ),
    })?;

    unit.to_duration(settings.keep_alive_time)
        .ok_or_else(|| ConfigError::Invalid {
            key: "keepAliveTime".into(),
            message: format!(
                "{} {} does not fit in a duration",
                settings.keep_alive_time, settings.time_unit
            ),
        })
}

fn resolve_thread_factory(
    settings: &PoolSettings,
    registry: &ExtensionRegistry,
) -> Result<Arc<dyn ThreadFactory>, ConfigError> {
    match non_empty(&settings.thread_factory_bean_name) {
        Some(name) => registry.thread_factory("threadFactoryBeanName", name),
        None => Ok(default_thread_factory()),
    }
}

/// Custom handler first, then preset name, then CallerRuns.
///
/// When both a custom handler name and a preset name are given the custom
/// handler wins and the preset is ignored (with a warning). The preset is
/// still not validated in that case.
fn resolve_rejection_policy(
    settings: &PoolSettings,
    registry: &ExtensionRegistry,
) -> Result<RejectionPolicy, ConfigError> {
    let preset = non_empty(&settings.reject_strategy);

    if let Some(name) = non_empty(&settings.reject_strategy_bean_name) {
        if let Some(ignored) = preset {
            tracing::warn!(
                reject_strategy = ignored,
                reject_strategy_bean_name = name,
                "both rejectStrategy and rejectStrategyBeanName are set; using the custom handler"
            );
        }
        let handler = registry.rejection_handler("rejectStrategyBeanName", name)?;
        return Ok(RejectionPolicy::Custom(handler));
    }

    match preset {
        Some(name) => RejectionPolicy::preset(name).ok_or_else(|| ConfigError::Invalid {
            key: "rejectStrategy".into(),
            message: format!(
                "'{}', expected one of: {}",
                name,
                PRESET_POLICY_NAMES.join(", ")
            ),
        }),
        None => Ok(RejectionPolicy::CallerRuns),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
