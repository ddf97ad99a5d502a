//! Builtin factory registrations
//!
//! Wires the provider implementations into a [`ServiceGraph`] under
//! stable type names so configuration can reference them with the
//! `"()"` constructor key.

use crate::graph::registry::{BuiltService, ServiceGraph};
use conflux_domain::error::Error;
use conflux_domain::ports::cache::CacheBackend;
use conflux_domain::ports::coder::Coder;
use conflux_providers::cache::{MemoryCacheBackend, NullCacheBackend};
use conflux_providers::coder::JsonCoder;
use std::sync::Arc;

/// Register factories for every provider this crate ships
pub fn register_builtin_factories(graph: &ServiceGraph) {
    graph.register_factory("memory_cache", |args| {
        let mut backend = match args.value("max_entries") {
            Some(v) => {
                let max_entries = v.as_u64().ok_or_else(|| {
                    Error::config("memory_cache 'max_entries' must be a non-negative integer")
                })?;
                MemoryCacheBackend::with_capacity(max_entries)
            }
            None => MemoryCacheBackend::new(),
        };
        if let Some(ttl) = args.duration_secs("ttl_seconds") {
            backend = backend.with_default_ttl(ttl);
        }
        Ok(BuiltService::new(Arc::new(backend) as Arc<dyn CacheBackend>))
    });

    graph.register_factory("null_cache", |_args| {
        let backend: Arc<dyn CacheBackend> = Arc::new(NullCacheBackend::new());
        Ok(BuiltService::new(backend))
    });

    graph.register_factory("json_coder", |_args| {
        let coder: Arc<dyn Coder> = Arc::new(JsonCoder::new());
        Ok(BuiltService::new(coder))
    });
}
