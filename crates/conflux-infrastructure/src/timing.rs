//! Timing instrumentation helpers

use std::time::{Duration, Instant};

/// Tracks one operation's elapsed time
pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    /// Start a new timed operation
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Elapsed time as a Duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
