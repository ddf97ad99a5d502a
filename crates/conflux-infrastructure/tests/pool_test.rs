//! Tests for the object pool

use conflux_domain::error::Error;
use conflux_infrastructure::pool::ObjectPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_pool_grows_lazily_up_to_capacity() {
    let created = Arc::new(AtomicUsize::new(0));
    let pool = {
        let created = Arc::clone(&created);
        ObjectPool::new(3, move || {
            Ok(created.fetch_add(1, Ordering::SeqCst))
        })
    };
    assert_eq!(pool.total(), 0);

    let a = pool.acquire(None).await.unwrap();
    let b = pool.acquire(None).await.unwrap();
    assert_eq!(pool.total(), 2);
    assert_eq!(created.load(Ordering::SeqCst), 2);

    pool.release(a).await;
    pool.release(b).await;

    // Released objects are reused before anything new is created
    let _ = pool.acquire(None).await.unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_debug_output_reports_capacity_and_total() {
    let pool = ObjectPool::new(2, || Ok(1u32));
    let _held = pool.acquire(None).await.unwrap();

    let rendered = format!("{pool:?}");
    assert!(rendered.contains("capacity: 2"), "got {rendered}");
    assert!(rendered.contains("total: 1"), "got {rendered}");
}

#[tokio::test]
async fn test_exhausted_pool_times_out() {
    let pool = ObjectPool::new(1, || Ok(()));
    let held = pool.acquire(None).await.unwrap();

    let err = pool
        .acquire(Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    pool.release(held).await;
    pool.acquire(Some(Duration::from_millis(50))).await.unwrap();
}

#[tokio::test]
async fn test_release_wakes_waiting_acquirer() {
    let pool = Arc::new(ObjectPool::new(1, || Ok(7u32)));
    let held = pool.acquire(None).await.unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.acquire(Some(Duration::from_secs(1))).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    pool.release(held).await;

    assert_eq!(waiter.await.unwrap().unwrap(), 7);
}

#[tokio::test]
async fn test_factory_failure_does_not_leak_a_slot() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let pool = {
        let attempts = Arc::clone(&attempts);
        ObjectPool::new(1, move || {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::internal("flaky factory"))
            } else {
                Ok(1u32)
            }
        })
    };

    assert!(pool.acquire(None).await.is_err());
    assert_eq!(pool.total(), 0);

    // The slot freed by the failure is available again
    assert_eq!(pool.acquire(None).await.unwrap(), 1);
    assert_eq!(pool.total(), 1);
}
