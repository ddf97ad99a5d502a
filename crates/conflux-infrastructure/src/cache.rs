//! Read-through cache layer
//!
//! Composes a [`CacheBackend`] resolved from the service graph, a
//! [`Coder`] for the byte representation and a [`SingleFlight`] window
//! so concurrent callers that miss on the same key produce exactly one
//! computation and one backend write.
//!
//! The layer degrades gracefully: backend read and write failures are
//! logged and treated as misses, never surfaced to the caller. Only
//! computation and codec failures propagate.

use crate::graph::ServiceGraph;
use crate::singleflight::SingleFlight;
use crate::timing::TimedOperation;
use conflux_domain::error::Result;
use conflux_domain::keys::CallKey;
use conflux_domain::ports::cache::CacheBackend;
use conflux_domain::ports::coder::Coder;
use conflux_providers::coder::JsonCoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Graph name of the backend used when callers do not pick one
pub const DEFAULT_CACHE_BACKEND: &str = "cache.default";

/// Read-through, single-flight cache over graph-resolved backends
pub struct CacheLayer {
    graph: Arc<ServiceGraph>,
    flight: SingleFlight<Vec<u8>>,
    coder: Arc<dyn Coder>,
}

impl CacheLayer {
    /// Create a layer resolving backends from `graph`, with the JSON
    /// coder and default gate timeout
    pub fn new(graph: Arc<ServiceGraph>) -> Self {
        Self {
            graph,
            flight: SingleFlight::new(),
            coder: Arc::new(JsonCoder::new()),
        }
    }

    /// Replace the byte coder
    pub fn with_coder(mut self, coder: Arc<dyn Coder>) -> Self {
        self.coder = coder;
        self
    }

    /// Bound how long a caller waits to join a coalescing window
    pub fn with_gate_timeout(mut self, timeout: Duration) -> Self {
        self.flight = self.flight.with_gate_timeout(timeout);
        self
    }

    /// Number of currently open coalescing windows
    pub fn in_flight(&self) -> usize {
        self.flight.in_flight()
    }

    /// Look up `key` in `backend_name`, computing and storing on miss
    ///
    /// Concurrent callers of the same fingerprint share one computation
    /// through the single-flight window. `ttl` of `None` stores the
    /// entry without expiry.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &CallKey,
        backend_name: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let storage_key = key.fingerprint()?;
        let backend = self
            .graph
            .get_as::<Arc<dyn CacheBackend>>(backend_name)?;
        let coder = Arc::clone(&self.coder);
        let window_key = storage_key.clone();

        let bytes = self
            .flight
            .run(&window_key, || async move {
                match backend.get_with_ttl(&storage_key).await {
                    Ok((remaining_ttl, Some(bytes))) => {
                        tracing::debug!(
                            key = %storage_key,
                            backend = backend.backend_name(),
                            remaining_ttl,
                            "cache hit"
                        );
                        return Ok(bytes);
                    }
                    Ok((_, None)) => {}
                    Err(err) => {
                        tracing::warn!(key = %storage_key, error = %err, "cache read failed, treating as miss");
                    }
                }

                let timer = TimedOperation::start();
                let value = compute().await?;
                let bytes = coder.encode(&serde_json::to_value(value)?)?;
                tracing::debug!(
                    key = %storage_key,
                    elapsed_ms = timer.elapsed_ms(),
                    "cache miss, value computed"
                );

                if let Err(err) = backend.set(&storage_key, bytes.clone(), ttl).await {
                    tracing::warn!(key = %storage_key, error = %err, "cache write failed, result kept");
                }
                Ok(bytes)
            })
            .await?;

        Ok(serde_json::from_value(self.coder.decode(&bytes)?)?)
    }

    /// Remove `key` from `backend_name`, reporting how many entries
    /// were deleted
    pub async fn invalidate(&self, key: &CallKey, backend_name: &str) -> Result<u64> {
        let storage_key = key.fingerprint()?;
        let backend = self
            .graph
            .get_as::<Arc<dyn CacheBackend>>(backend_name)?;
        backend.delete(&storage_key).await
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("coder", &self.coder.coder_name())
            .field("in_flight", &self.flight.in_flight())
            .finish()
    }
}
