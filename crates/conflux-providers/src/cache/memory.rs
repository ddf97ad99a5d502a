//! In-memory cache backend
//!
//! High-performance concurrent in-memory backend using Moka with
//! per-entry expiry, so each `set` carries its own ttl.

use async_trait::async_trait;
use conflux_domain::error::Result;
use conflux_domain::ports::cache::{CacheBackend, TTL_NO_EXPIRY};
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

#[derive(Clone)]
struct StoredEntry {
    bytes: Arc<Vec<u8>>,
    stored_at: Instant,
    ttl: Option<Duration>,
}

impl StoredEntry {
    /// Remaining ttl in whole seconds, rounded up so a live entry
    /// always reports a positive value
    fn remaining_ttl(&self) -> Option<i64> {
        match self.ttl {
            None => Some(TTL_NO_EXPIRY),
            Some(ttl) => {
                let remaining = ttl.checked_sub(self.stored_at.elapsed())?;
                Some(remaining.as_secs_f64().ceil() as i64)
            }
        }
    }
}

struct PerEntryExpiry;

impl Expiry<String, StoredEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Moka-based in-memory cache backend
#[derive(Clone)]
pub struct MemoryCacheBackend {
    cache: Cache<String, StoredEntry>,
    max_entries: u64,
    default_ttl: Option<Duration>,
}

impl MemoryCacheBackend {
    /// Create a backend with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Create a backend bounded to `max_entries`
    pub fn with_capacity(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryExpiry)
            .build();
        Self {
            cache,
            max_entries,
            default_ttl: None,
        }
    }

    /// Apply `ttl` to entries stored without an explicit one
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Maximum number of entries this backend will hold
    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    /// Current number of live entries
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get_with_ttl(&self, key: &str) -> Result<(i64, Option<Vec<u8>>)> {
        match self.cache.get(key).await {
            Some(entry) => match entry.remaining_ttl() {
                // ttl ran out between Moka's clock and ours
                None => Ok((0, None)),
                Some(ttl) => Ok((ttl, Some(entry.bytes.as_ref().clone()))),
            },
            None => Ok((0, None)),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let (_, value) = self.get_with_ttl(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let entry = StoredEntry {
            bytes: Arc::new(value),
            stored_at: Instant::now(),
            ttl: ttl.or(self.default_ttl),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let existed = self.cache.contains_key(key);
        self.cache.invalidate(key).await;
        Ok(u64::from(existed))
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheBackend")
            .field("max_entries", &self.max_entries)
            .finish()
    }
}
