//! Lazily-grown object pool
//!
//! Hands out reusable objects over a [`BoundedChannel`]: objects are
//! created on demand until the pool reaches capacity, after which
//! callers wait for a release. Callers own acquired objects and are
//! expected to hand them back with [`ObjectPool::release`].

use crate::channel::BoundedChannel;
use conflux_domain::error::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Pool of reusable objects with a fixed upper bound
pub struct ObjectPool<T> {
    idle: BoundedChannel<T>,
    total: AtomicUsize,
    make: Box<dyn Fn() -> Result<T> + Send + Sync>,
}

impl<T: Send> ObjectPool<T> {
    /// Create a pool of at most `size` objects built by `make`
    pub fn new<F>(size: usize, make: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            idle: BoundedChannel::new(size),
            total: AtomicUsize::new(0),
            make: Box::new(make),
        }
    }

    /// Number of objects the pool has created and not discarded
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    /// Take an object, reusing an idle one when available and creating
    /// a new one while the pool is below capacity
    ///
    /// Waits up to `timeout` for a release when the pool is exhausted.
    pub async fn acquire(&self, timeout: Option<Duration>) -> Result<T> {
        // Reuse before growing; the zero timeout makes this a try-pop.
        if let Ok(item) = self.idle.pop(Some(Duration::ZERO)).await {
            return Ok(item);
        }

        let grew = self
            .total
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.idle.capacity()).then_some(n + 1)
            })
            .is_ok();
        if grew {
            return (self.make)().map_err(|err| {
                self.total.fetch_sub(1, Ordering::AcqRel);
                err
            });
        }
        self.idle.pop(timeout).await
    }

    /// Return an object to the pool
    ///
    /// If the pool is already full the object is discarded.
    pub async fn release(&self, item: T) {
        if self.idle.push(item, Some(Duration::ZERO)).await.is_err() {
            self.total.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("capacity", &self.idle.capacity())
            .field("total", &self.total.load(Ordering::Acquire))
            .finish()
    }
}
