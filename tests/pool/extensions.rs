//! Settings resolution and registry extension tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use bounded_pool::pool::{NamedThreadFactory, PoolResult, Task};
use bounded_pool::{
    autoconfigure, ConfigError, Error, ExtensionRegistry, PoolError, PoolSettings, Submission,
    WorkerPool,
};

use crate::helpers::{pool_with, Blockers, TIMEOUT};

#[test]
fn test_custom_handler_from_registry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen_depth = Arc::new(Mutex::new(None));

    let mut registry = ExtensionRegistry::new();
    {
        let calls = Arc::clone(&calls);
        let seen_depth = Arc::clone(&seen_depth);
        registry.register_rejection_handler(
            "overflow",
            move |task: Task, pool: &WorkerPool| -> PoolResult<Submission> {
                calls.fetch_add(1, Ordering::SeqCst);
                *seen_depth.lock().unwrap() = Some(pool.status().queue_depth);
                thread::spawn(move || task.run());
                Ok(Submission::Handled)
            },
        );
    }

    let settings = PoolSettings::default()
        .with_workers(1, 1)
        .with_queue_size(1)
        .with_reject_strategy_bean("overflow");
    let pool = pool_with(&settings, &registry);
    assert_eq!(pool.spec().rejection_policy().name(), "Custom");

    let blockers = Blockers::new();
    pool.submit(blockers.task(1)).unwrap();
    pool.submit(blockers.task(2)).unwrap();

    let (tx, rx) = mpsc::channel();
    let outcome = pool.submit(move || tx.send("overflowed").unwrap()).unwrap();

    assert_eq!(outcome, Submission::Handled);
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "overflowed");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*seen_depth.lock().unwrap(), Some(1));
    assert_eq!(pool.status().saturated, 1);

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
}

#[test]
fn test_custom_handler_error_reaches_submitter() {
    let mut registry = ExtensionRegistry::new();
    registry.register_rejection_handler(
        "refuse",
        |_task: Task, pool: &WorkerPool| -> PoolResult<Submission> {
            let status = pool.status();
            Err(PoolError::Rejected {
                pool_size: status.pool_size,
                queue_depth: status.queue_depth,
                queue_capacity: status.queue_capacity,
            })
        },
    );

    let settings = PoolSettings::default()
        .with_workers(1, 1)
        .with_queue_size(1)
        .with_reject_strategy("DiscardPolicy")
        .with_reject_strategy_bean("refuse");
    let pool = pool_with(&settings, &registry);

    let blockers = Blockers::new();
    pool.submit(blockers.task(1)).unwrap();
    pool.submit(blockers.task(2)).unwrap();

    let err = pool.submit(|| {}).unwrap_err();
    assert!(err.is_rejected());

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
}

#[test]
fn test_named_thread_factory_from_registry() {
    let mut registry = ExtensionRegistry::new();
    registry.register_thread_factory("named", NamedThreadFactory::new("it-worker"));

    let settings = PoolSettings::default()
        .with_workers(1, 1)
        .with_thread_factory_bean("named");
    let pool = pool_with(&settings, &registry);

    let name = pool
        .submit_with_handle(|| thread::current().name().map(String::from))
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(name.as_deref(), Some("it-worker-0"));
}

#[test]
fn test_autoconfigure_errors_name_the_option() {
    let registry = ExtensionRegistry::new();

    let cases = [
        (PoolSettings::default().with_workers(4, 2), "maximumPoolSize"),
        (PoolSettings::default().with_keep_alive(5, "fortnights"), "timeUnit"),
        (PoolSettings::default().with_reject_strategy("Retry"), "rejectStrategy"),
        (
            PoolSettings::default().with_reject_strategy_bean("missing"),
            "rejectStrategyBeanName",
        ),
        (
            PoolSettings::default().with_thread_factory_bean("missing"),
            "threadFactoryBeanName",
        ),
    ];

    for (settings, key) in cases {
        match autoconfigure(&settings, &registry) {
            Err(Error::Config(err)) => {
                assert_eq!(err.key(), key);
                assert!(err.to_string().contains(key), "{}", err);
            }
            other => panic!("expected config error for {}, got {:?}", key, other.map(|p| p.is_some())),
        }
    }
}

#[test]
fn test_extension_with_wrong_capability() {
    let mut registry = ExtensionRegistry::new();
    registry.register_thread_factory("factory", NamedThreadFactory::new("x"));

    let settings = PoolSettings::default().with_reject_strategy_bean("factory");
    match autoconfigure(&settings, &registry) {
        Err(Error::Config(ConfigError::CapabilityMismatch { name, .. })) => {
            assert_eq!(name, "factory");
        }
        other => panic!("expected capability mismatch, got {:?}", other.map(|p| p.is_some())),
    }
}

#[test]
fn test_settings_from_environment() {
    std::env::set_var("THREAD_POOL_CORE_POOL_SIZE", "2");
    std::env::set_var("THREAD_POOL_MAXIMUM_POOL_SIZE", "3");
    std::env::set_var("THREAD_POOL_KEEP_ALIVE_TIME", "30");
    std::env::set_var("THREAD_POOL_TIME_UNIT", "seconds");
    std::env::set_var("THREAD_POOL_QUEUE_SIZE", "7");
    std::env::set_var("THREAD_POOL_REJECT_STRATEGY", "AbortPolicy");

    let settings = PoolSettings::from_env();

    for name in [
        "CORE_POOL_SIZE",
        "MAXIMUM_POOL_SIZE",
        "KEEP_ALIVE_TIME",
        "TIME_UNIT",
        "QUEUE_SIZE",
        "REJECT_STRATEGY",
    ] {
        std::env::remove_var(format!("THREAD_POOL_{}", name));
    }

    let settings = settings.unwrap();
    let pool = autoconfigure(&settings, &ExtensionRegistry::new())
        .unwrap()
        .expect("enabled by default");

    let status = pool.status();
    assert_eq!(status.core_workers, 2);
    assert_eq!(status.max_workers, 3);
    assert_eq!(status.queue_capacity, Some(7));
    assert_eq!(pool.spec().idle_timeout(), std::time::Duration::from_secs(30));
    assert_eq!(pool.spec().rejection_policy().name(), "AbortPolicy");
}
