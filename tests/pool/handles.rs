//! Result handle tests, blocking and async

use bounded_pool::PoolError;

use crate::helpers::{pool, Blockers};

#[test]
fn test_join_returns_value() {
    let pool = pool(2, 2, 10, "AbortPolicy");
    let handles: Vec<_> = (0..10u64)
        .map(|i| pool.submit_with_handle(move || i * i).unwrap())
        .collect();

    let results: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, (0..10u64).map(|i| i * i).collect::<Vec<_>>());
}

#[test]
fn test_panicked_task_handle_is_cancelled() {
    let pool = pool(1, 1, 10, "AbortPolicy");
    let handle = pool
        .submit_with_handle(|| -> u32 { panic!("task failed") })
        .unwrap();

    assert_eq!(handle.join().unwrap_err(), PoolError::Cancelled);
    let after = pool.submit_with_handle(|| 5u32).unwrap();
    assert_eq!(after.join().unwrap(), 5);
    assert_eq!(pool.status().panicked, 1);
}

#[test]
fn test_discarded_task_handle_is_cancelled() {
    let pool = pool(1, 1, 1, "DiscardPolicy");
    let blockers = Blockers::new();
    pool.submit(blockers.task(1)).unwrap();
    pool.submit(blockers.task(2)).unwrap();

    let handle = pool.submit_with_handle(|| "never").unwrap();
    assert_eq!(handle.join().unwrap_err(), PoolError::Cancelled);

    blockers.release();
}

#[tokio::test]
async fn test_handle_can_be_awaited() {
    let pool = pool(2, 2, 10, "AbortPolicy");

    let a = pool.submit_with_handle(|| 6 * 7).unwrap();
    let b = pool
        .submit_with_handle(|| String::from("from a worker"))
        .unwrap();

    assert_eq!(a.await.unwrap(), 42);
    assert_eq!(b.await.unwrap(), "from a worker");
}
