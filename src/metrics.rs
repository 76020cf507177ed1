//! Prometheus export of pool status.
//!
//! Every value is a gauge mirroring the last observed [`PoolStatus`];
//! cumulative counters are exposed as monotonic gauges so a snapshot can be
//! applied as-is.

use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::pool::PoolStatus;

/// Prometheus gauges for one worker pool.
pub struct PoolMetrics {
    registry: Registry,

    /// Live worker threads.
    pub workers: IntGauge,
    /// Workers running a task.
    pub workers_active: IntGauge,
    /// Tasks waiting in the queue.
    pub queue_depth: IntGauge,
    /// Queue capacity (-1 = unbounded).
    pub queue_capacity: IntGauge,
    /// Cumulative task counts by outcome.
    pub tasks: IntGaugeVec,
}

impl PoolMetrics {
    /// Create and register all gauges, labelled with the pool name.
    pub fn new(pool: &str) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let workers = IntGauge::with_opts(
            Opts::new("bounded_pool_workers", "Live worker threads").const_label("pool", pool),
        )?;
        registry.register(Box::new(workers.clone()))?;

        let workers_active = IntGauge::with_opts(
            Opts::new("bounded_pool_workers_active", "Workers running a task")
                .const_label("pool", pool),
        )?;
        registry.register(Box::new(workers_active.clone()))?;

        let queue_depth = IntGauge::with_opts(
            Opts::new("bounded_pool_queue_depth", "Tasks waiting in the queue")
                .const_label("pool", pool),
        )?;
        registry.register(Box::new(queue_depth.clone()))?;

        let queue_capacity = IntGauge::with_opts(
            Opts::new(
                "bounded_pool_queue_capacity",
                "Queue capacity, -1 when unbounded",
            )
            .const_label("pool", pool),
        )?;
        registry.register(Box::new(queue_capacity.clone()))?;

        let tasks = IntGaugeVec::new(
            Opts::new("bounded_pool_tasks", "Cumulative tasks by outcome").const_label("pool", pool),
            &["outcome"],
        )?;
        registry.register(Box::new(tasks.clone()))?;

        Ok(Self {
            registry,
            workers,
            workers_active,
            queue_depth,
            queue_capacity,
            tasks,
        })
    }

    /// Apply a status snapshot.
    pub fn observe(&self, status: &PoolStatus) {
        self.workers.set(status.pool_size as i64);
        self.workers_active.set(status.active as i64);
        self.queue_depth.set(status.queue_depth as i64);
        self.queue_capacity
            .set(status.queue_capacity.map_or(-1, |c| c as i64));

        for (outcome, value) in [
            ("submitted", status.submitted),
            ("completed", status.completed),
            ("saturated", status.saturated),
            ("rejected", status.rejected),
            ("discarded", status.discarded),
            ("caller_runs", status.caller_runs),
            ("panicked", status.panicked),
        ] {
            self.tasks.with_label_values(&[outcome]).set(value as i64);
        }
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// The underlying registry, for hosts that merge it into their own.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
