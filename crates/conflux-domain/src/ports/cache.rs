//! Cache backend port
//!
//! Contract for pluggable cache storage. Implementations store opaque
//! byte payloads under fingerprint keys with optional expiry; the cache
//! layer never mutates entries except through `set`/`delete`.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remaining-ttl sentinel for entries stored without an expiry
pub const TTL_NO_EXPIRY: i64 = -1;

/// Cache backend port
///
/// Byte payloads are opaque to the backend. A miss is reported as
/// `(0, None)`; a hit reports the remaining ttl in whole seconds, or
/// [`TTL_NO_EXPIRY`] for entries stored without one.
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Get a value together with its remaining ttl
    async fn get_with_ttl(&self, key: &str) -> Result<(i64, Option<Vec<u8>>)>;

    /// Get a value without ttl information
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value, optionally expiring after `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Delete a value, returning how many entries were removed
    async fn delete(&self, key: &str) -> Result<u64>;

    /// Identifier of this backend implementation (e.g. "memory", "null")
    fn backend_name(&self) -> &str;
}
