//! Graceful and immediate shutdown tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bounded_pool::pool::RunState;
use bounded_pool::PoolError;

use crate::helpers::{pool, Blockers, TIMEOUT};

#[test]
fn test_graceful_shutdown_runs_queued_tasks() {
    let pool = pool(2, 2, 100, "AbortPolicy");
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..20 {
        let done = Arc::clone(&done);
        pool.submit(move || {
            thread::sleep(Duration::from_millis(2));
            done.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    pool.shutdown();
    assert!(pool.is_shutdown());
    assert!(pool.await_termination(TIMEOUT));
    assert!(pool.is_terminated());

    assert_eq!(done.load(Ordering::SeqCst), 20);
    let status = pool.status();
    assert_eq!(status.state, RunState::Terminated);
    assert_eq!(status.completed, 20);
    assert_eq!(status.pool_size, 0);
}

#[test]
fn test_submit_after_shutdown_is_rejected_for_every_policy() {
    for strategy in ["CallerRunsPolicy", "AbortPolicy", "DiscardPolicy", "DiscardOldestPolicy"] {
        let pool = pool(1, 1, 1, strategy);
        pool.shutdown();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let err = pool
            .submit(move || flag.store(true, Ordering::SeqCst))
            .unwrap_err();

        assert_eq!(err, PoolError::ShutdownRejected, "{}", strategy);
        assert!(err.is_shutdown());
        assert!(!ran.load(Ordering::SeqCst), "{}", strategy);
        assert_eq!(pool.status().saturated, 0, "{}", strategy);
    }
}

#[test]
fn test_shutdown_is_idempotent() {
    let pool = pool(1, 1, 1, "AbortPolicy");
    pool.submit(|| {}).unwrap();

    pool.shutdown();
    pool.shutdown();
    assert!(pool.await_termination(TIMEOUT));
    pool.shutdown();
    assert!(pool.is_terminated());
}

#[test]
fn test_await_termination_times_out_while_busy() {
    let pool = pool(1, 1, 1, "AbortPolicy");
    let blockers = Blockers::new();
    pool.submit(blockers.task(1)).unwrap();
    blockers.wait_started(1);

    pool.shutdown();
    assert!(!pool.await_termination(Duration::from_millis(20)));
    assert!(!pool.is_terminated());

    blockers.release();
    assert!(pool.await_termination(TIMEOUT));
}

#[test]
fn test_shutdown_now_abandons_queue_and_cancels() {
    let pool = pool(1, 1, 10, "AbortPolicy");
    let token = pool.cancellation_token();
    let stopped_early = Arc::new(AtomicBool::new(false));

    let (started_tx, started_rx) = mpsc::channel();
    {
        let token = token.clone();
        let stopped_early = Arc::clone(&stopped_early);
        pool.submit(move || {
            let _ = started_tx.send(());
            let deadline = std::time::Instant::now() + TIMEOUT;
            while std::time::Instant::now() < deadline {
                if token.is_cancelled() {
                    stopped_early.store(true, Ordering::SeqCst);
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();
    }
    started_rx.recv_timeout(TIMEOUT).unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    for _ in 0..4 {
        let ran = Arc::clone(&ran);
        pool.submit(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    let handle = pool.submit_with_handle(|| 1).unwrap();

    let abandoned = pool.shutdown_now();
    assert_eq!(abandoned.len(), 5);
    assert!(token.is_cancelled());
    assert!(pool.status().state >= RunState::Stop);

    assert!(pool.await_termination(TIMEOUT));
    assert!(stopped_early.load(Ordering::SeqCst));
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    drop(abandoned);
    assert_eq!(handle.join().unwrap_err(), PoolError::Cancelled);
}

#[test]
fn test_abandoned_tasks_can_be_run_by_caller() {
    let pool = pool(1, 1, 10, "AbortPolicy");
    let blockers = Blockers::new();
    pool.submit(blockers.task(1)).unwrap();
    blockers.wait_started(1);

    let handle = pool.submit_with_handle(|| "salvaged").unwrap();
    let abandoned = pool.stop(false);
    assert_eq!(abandoned.len(), 1);

    for task in abandoned {
        task.run();
    }
    assert_eq!(handle.join().unwrap(), "salvaged");

    blockers.release();
    assert!(pool.await_termination(TIMEOUT));
}

#[test]
fn test_drop_shuts_down_gracefully() {
    let (tx, rx) = mpsc::channel();
    {
        let pool = pool(1, 1, 10, "AbortPolicy");
        for i in 0..5 {
            let tx = tx.clone();
            pool.submit(move || {
                let _ = tx.send(i);
            })
            .unwrap();
        }
    }
    drop(tx);

    let mut received: Vec<i32> = Vec::new();
    while let Ok(i) = rx.recv_timeout(TIMEOUT) {
        received.push(i);
    }
    assert_eq!(received, vec![0, 1, 2, 3, 4]);
}
