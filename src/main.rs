use std::time::Duration;

use tracing::{error, info};

use bounded_pool::config::Config;
use bounded_pool::metrics::PoolMetrics;
use bounded_pool::pool::NamedThreadFactory;
use bounded_pool::{autoconfigure, logging, ExtensionRegistry};

/// How long a graceful shutdown may take before the process gives up waiting.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    logging::init(&config.logging);

    info!("Starting bounded_pool {}...", bounded_pool::PKG_VERSION);
    config.log_summary();

    let mut registry = ExtensionRegistry::new();
    registry.register_thread_factory("named", NamedThreadFactory::new("bounded-pool"));

    let pool = match autoconfigure(&config.pool, &registry) {
        Ok(Some(pool)) => pool,
        Ok(None) => return Ok(()),
        Err(e) => {
            error!(error = %e, "failed to configure worker pool");
            return Err(e.into());
        }
    };

    let metrics = PoolMetrics::new(pool.name()).map_err(|e| e.to_string())?;
    let interval = config.status_interval;

    // The pool threads do the work; the runtime only waits for signals.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let status = pool.status();
                    metrics.observe(&status);
                    info!(
                        workers = status.pool_size,
                        active = status.active,
                        queued = status.queue_depth,
                        completed = status.completed,
                        rejected = status.rejected,
                        discarded = status.discarded,
                        "pool status"
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down...");
                    break;
                }
            }
        }
    });

    pool.shutdown();
    if !pool.await_termination(SHUTDOWN_TIMEOUT) {
        error!(timeout_secs = SHUTDOWN_TIMEOUT.as_secs(), "worker pool did not terminate in time");
    }
    print!("{}", metrics.encode());

    Ok(())
}
