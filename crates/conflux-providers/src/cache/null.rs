//! Null cache backend
//!
//! Never stores anything; every read is a miss. Used when caching is
//! disabled and as a harmless default in tests.

use async_trait::async_trait;
use conflux_domain::error::Result;
use conflux_domain::ports::cache::CacheBackend;
use std::time::Duration;

/// No-op cache backend
#[derive(Debug, Clone, Default)]
pub struct NullCacheBackend;

impl NullCacheBackend {
    /// Create a new null backend
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheBackend for NullCacheBackend {
    async fn get_with_ttl(&self, _key: &str) -> Result<(i64, Option<Vec<u8>>)> {
        Ok((0, None))
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<u64> {
        Ok(0)
    }

    fn backend_name(&self) -> &str {
        "null"
    }
}
