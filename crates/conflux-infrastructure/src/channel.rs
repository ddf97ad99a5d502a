//! Bounded asynchronous FIFO channel
//!
//! Fixed-capacity queue with timeout-bounded push and pop. "Blocking"
//! here means suspending the task, never an OS thread; a timed-out wait
//! leaves the queue untouched. Waiters are woken in arrival order, so
//! contention stays starvation-free.

use conflux_domain::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// Fixed-capacity asynchronous FIFO queue
pub struct BoundedChannel<T> {
    queue: Mutex<VecDeque<T>>,
    capacity: usize,
    len: AtomicUsize,
    not_full: Notify,
    not_empty: Notify,
}

impl<T> BoundedChannel<T> {
    /// Create a channel holding at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "channel capacity must be at least 1");
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            len: AtomicUsize::new(0),
            not_full: Notify::new(),
            not_empty: Notify::new(),
        }
    }

    /// Maximum number of items the channel can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of enqueued items
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether the channel is at capacity
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Whether the channel holds no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send> BoundedChannel<T> {
    /// Enqueue an item, waiting for space up to `timeout`
    ///
    /// `None` waits indefinitely. Returns [`Error::Timeout`] if no space
    /// became available in time; the item is dropped in that case and
    /// the queue is left unchanged.
    pub async fn push(&self, item: T, timeout: Option<Duration>) -> Result<()> {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
        loop {
            // Arm the waiter before re-checking so a notify between the
            // check and the await is not lost.
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut queue = self.queue.lock().await;
                if queue.len() < self.capacity {
                    queue.push_back(item);
                    self.len.store(queue.len(), Ordering::Release);
                    drop(queue);
                    self.not_empty.notify_one();
                    return Ok(());
                }
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Err(Error::timeout("channel push"));
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Dequeue the oldest item, waiting up to `timeout`
    ///
    /// `None` waits indefinitely. Returns [`Error::Timeout`] if nothing
    /// arrived in time.
    pub async fn pop(&self, timeout: Option<Duration>) -> Result<T> {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut queue = self.queue.lock().await;
                if let Some(item) = queue.pop_front() {
                    self.len.store(queue.len(), Ordering::Release);
                    drop(queue);
                    self.not_full.notify_one();
                    return Ok(item);
                }
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Err(Error::timeout("channel pop"));
                    }
                }
                None => notified.await,
            }
        }
    }
}

impl<T> std::fmt::Debug for BoundedChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedChannel")
            .field("capacity", &self.capacity)
            .field("len", &self.len.load(Ordering::Acquire))
            .finish()
    }
}
