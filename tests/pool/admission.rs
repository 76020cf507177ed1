//! Admission control and rejection policy tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use bounded_pool::pool::QueueCapacity;
use bounded_pool::{PoolBuilder, PoolError, PoolSpec, RejectionPolicy, Submission};

use crate::helpers::{pool, Blockers, TIMEOUT};

#[test]
fn test_abort_rejects_when_saturated() {
    let pool = pool(2, 2, 1, "AbortPolicy");
    let blockers = Blockers::new();

    assert_eq!(pool.submit(blockers.task(1)).unwrap(), Submission::Started);
    assert_eq!(pool.submit(blockers.task(2)).unwrap(), Submission::Started);
    assert_eq!(pool.submit(blockers.task(3)).unwrap(), Submission::Queued);
    blockers.wait_started(2);

    let err = pool.submit(blockers.task(4)).unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(
        err,
        PoolError::Rejected {
            pool_size: 2,
            queue_depth: 1,
            queue_capacity: Some(1),
        }
    );

    let status = pool.status();
    assert_eq!(status.saturated, 1);
    assert_eq!(status.rejected, 1);
    assert_eq!(status.submitted, 4);

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
    assert_eq!(blockers.finished(), vec![1, 2, 3]);
}

#[test]
fn test_caller_runs_on_submitting_thread() {
    let pool = pool(2, 2, 1, "CallerRunsPolicy");
    let blockers = Blockers::new();

    pool.submit(blockers.task(1)).unwrap();
    pool.submit(blockers.task(2)).unwrap();
    pool.submit(blockers.task(3)).unwrap();

    let caller = thread::current().id();
    let ran_on = Arc::new(std::sync::Mutex::new(None));
    let record = Arc::clone(&ran_on);

    let outcome = pool
        .submit(move || *record.lock().unwrap() = Some(thread::current().id()))
        .unwrap();

    // Already executed by the time submit returns.
    assert_eq!(outcome, Submission::RanOnCaller);
    assert_eq!(*ran_on.lock().unwrap(), Some(caller));

    let status = pool.status();
    assert_eq!(status.saturated, 1);
    assert_eq!(status.caller_runs, 1);
    assert_eq!(status.rejected, 0);

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
}

#[test]
fn test_caller_runs_panic_reaches_caller() {
    let pool = pool(1, 1, 1, "CallerRunsPolicy");
    let blockers = Blockers::new();
    pool.submit(blockers.task(1)).unwrap();
    pool.submit(blockers.task(2)).unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pool.submit(|| panic!("caller task failed"))
    }));
    assert!(result.is_err());

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
}

#[test]
fn test_discard_drops_incoming_task() {
    let pool = pool(1, 1, 1, "DiscardPolicy");
    let blockers = Blockers::new();
    pool.submit(blockers.task(1)).unwrap();
    pool.submit(blockers.task(2)).unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let outcome = pool.submit(move || flag.store(true, Ordering::SeqCst)).unwrap();

    assert_eq!(outcome, Submission::Discarded);
    assert!(!outcome.will_run());

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(blockers.finished(), vec![1, 2]);

    let status = pool.status();
    assert_eq!(status.discarded, 1);
    assert_eq!(status.saturated, 1);
}

#[test]
fn test_discard_oldest_evicts_head_of_queue() {
    let pool = pool(1, 1, 2, "DiscardOldestPolicy");
    let blockers = Blockers::new();

    pool.submit(blockers.task(1)).unwrap();
    blockers.wait_started(1);
    assert_eq!(pool.submit(blockers.task(2)).unwrap(), Submission::Queued);
    assert_eq!(pool.submit(blockers.task(3)).unwrap(), Submission::Queued);

    let outcome = pool.submit(blockers.task(4)).unwrap();
    assert_eq!(outcome, Submission::QueuedAfterEviction);
    assert_eq!(pool.status().queue_depth, 2);

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));

    // Task 2 was the oldest queued task and never ran.
    assert_eq!(blockers.finished(), vec![1, 3, 4]);
    let status = pool.status();
    assert_eq!(status.discarded, 1);
    assert_eq!(status.saturated, 1);
}

#[test]
fn test_discard_oldest_with_empty_queue_rejects() {
    // A zero-capacity queue can only be set on the spec directly.
    let spec = PoolSpec::new(1, 1)
        .unwrap()
        .with_queue_capacity(QueueCapacity::Bounded(0))
        .with_rejection_policy(RejectionPolicy::DiscardOldest);
    let pool = PoolBuilder::new(spec).build().unwrap();
    let blockers = Blockers::new();

    assert_eq!(pool.submit(blockers.task(1)).unwrap(), Submission::Started);
    let err = pool.submit(blockers.task(2)).unwrap_err();
    assert!(err.is_rejected());

    let status = pool.status();
    assert_eq!(status.discarded, 0);
    assert_eq!(status.rejected, 1);

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
    assert_eq!(blockers.finished(), vec![1]);
}

#[test]
fn test_growth_beyond_core_only_when_queue_full() {
    let pool = pool(1, 3, 2, "AbortPolicy");
    let blockers = Blockers::new();

    assert_eq!(pool.submit(blockers.task(1)).unwrap(), Submission::Started);
    assert_eq!(pool.submit(blockers.task(2)).unwrap(), Submission::Queued);
    assert_eq!(pool.submit(blockers.task(3)).unwrap(), Submission::Queued);
    assert_eq!(pool.status().pool_size, 1);

    assert_eq!(pool.submit(blockers.task(4)).unwrap(), Submission::Started);
    assert_eq!(pool.submit(blockers.task(5)).unwrap(), Submission::Started);
    assert!(pool.submit(blockers.task(6)).is_err());

    let status = pool.status();
    assert_eq!(status.pool_size, 3);
    assert_eq!(status.largest_pool_size, 3);
    assert_eq!(status.queue_depth, 2);

    blockers.release();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
    assert_eq!(blockers.finished(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_saturated_counted_once_per_overflow() {
    for strategy in ["CallerRunsPolicy", "AbortPolicy", "DiscardPolicy", "DiscardOldestPolicy"] {
        let pool = pool(1, 1, 1, strategy);
        let blockers = Blockers::new();
        pool.submit(blockers.task(1)).unwrap();
        pool.submit(blockers.task(2)).unwrap();

        let _ = pool.submit(|| {});
        assert_eq!(pool.status().saturated, 1, "{}", strategy);

        blockers.release();
        pool.shutdown();
        assert!(pool.await_termination(TIMEOUT), "{}", strategy);
    }
}
