//! Single-flight request coalescing
//!
//! Deduplicates concurrent invocations that share a fingerprint: one
//! caller (the leader) executes the operation while every other caller
//! of the same coalescing window waits on the flight's gate and
//! receives the leader's result. The gate is a capacity-1
//! [`BoundedChannel`] used as a binary semaphore; the flight map holds
//! one entry per open window and nothing else, so it is not a cache.

use crate::channel::BoundedChannel;
use conflux_domain::error::{Error, Result};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default bound on how long a caller waits for a window's gate
pub const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(3);

struct Flight<T> {
    gate: BoundedChannel<()>,
    slot: Mutex<Option<std::result::Result<T, Arc<Error>>>>,
}

impl<T> Flight<T> {
    fn new() -> Self {
        Self {
            gate: BoundedChannel::new(1),
            slot: Mutex::new(None),
        }
    }
}

/// Request coalescer keyed by fingerprint
///
/// Values are shared by cloning, so `T` is typically something cheap
/// like `Vec<u8>` or an `Arc`.
pub struct SingleFlight<T> {
    flights: DashMap<String, Arc<Flight<T>>>,
    gate_timeout: Duration,
    only_lock: bool,
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a coalescer with the default gate timeout
    pub fn new() -> Self {
        Self {
            flights: DashMap::new(),
            gate_timeout: DEFAULT_GATE_TIMEOUT,
            only_lock: false,
        }
    }

    /// Bound gate acquisition to `timeout`
    ///
    /// A caller that cannot acquire the gate within the bound gives up
    /// on coalescing and runs the operation itself, so one slow window
    /// can never wedge every caller of its key.
    pub fn with_gate_timeout(mut self, timeout: Duration) -> Self {
        self.gate_timeout = timeout;
        self
    }

    /// Switch to pure mutual-exclusion mode
    ///
    /// Every caller executes the operation once it holds the gate,
    /// sequentially; results are not shared.
    ///
    /// Exclusion is scoped to one window: the flight entry is removed
    /// when its first holder finishes, so a caller arriving after that
    /// opens a fresh gate and may overlap with holders still queued on
    /// the old one. Callers needing exclusion across windows should
    /// hold their own lock.
    pub fn only_lock(mut self) -> Self {
        self.only_lock = true;
        self
    }

    /// Number of currently open coalescing windows
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    /// Run `op` through the coalescing window for `key`
    ///
    /// At most one execution happens per window. Followers receive a
    /// clone of the leader's value; if the leader failed, the leader
    /// gets its error back verbatim while followers receive the
    /// captured copy as [`Error::Coalesced`].
    pub async fn run<F, Fut>(&self, key: &str, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Atomic create-if-absent: two racing callers for one key must
        // land on the same flight.
        let flight = {
            let entry = self
                .flights
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Flight::new()));
            Arc::clone(entry.value())
        };

        if flight
            .gate
            .push((), Some(self.gate_timeout))
            .await
            .is_err()
        {
            // The window is wedged behind a slow leader; abort the wait
            // and run solo to preserve liveness.
            tracing::warn!(key, "gate wait timed out, running uncoalesced");
            return op().await;
        }

        // Leadership test: the map must still hold *our* flight. A bare
        // key-presence check would mistake a successor window's fresh
        // entry for ours.
        let leading = self
            .flights
            .get(key)
            .map(|e| Arc::ptr_eq(e.value(), &flight))
            .unwrap_or(false);

        let result = if leading || self.only_lock {
            match op().await {
                Ok(value) => {
                    *flight.slot.lock().await = Some(Ok(value.clone()));
                    Ok(value)
                }
                Err(err) => {
                    // Followers get a captured copy; the executing caller
                    // keeps its error verbatim.
                    *flight.slot.lock().await = Some(Err(Arc::new(err.snapshot())));
                    Err(err)
                }
            }
        } else {
            match flight.slot.lock().await.clone() {
                Some(Ok(value)) => Ok(value),
                Some(Err(err)) => Err(Error::Coalesced { source: err }),
                None => Err(Error::internal("coalesced result missing")),
            }
        };

        // Cleanup: drop the map entry *before* releasing the gate, so a
        // waiter woken by the pop can never observe the stale entry and
        // become a duplicate leader.
        self.flights.remove_if(key, |_, v| Arc::ptr_eq(v, &flight));
        let _ = flight.gate.pop(Some(self.gate_timeout)).await;

        result
    }
}

impl<T> std::fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.flights.len())
            .field("gate_timeout", &self.gate_timeout)
            .field("only_lock", &self.only_lock)
            .finish()
    }
}
