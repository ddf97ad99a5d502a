//! # Conflux
//!
//! A coalescing cache runtime: concurrent calls that would compute the
//! same value are deduplicated into one execution, results flow through
//! a read-through cache layer, and the components involved (backends,
//! coders, anything else shared) are wired from declarative
//! configuration by a lazy service graph.
//!
//! ## Example
//!
//! ```ignore
//! use conflux::domain::CallKey;
//! use conflux::infrastructure::cache::{CacheLayer, DEFAULT_CACHE_BACKEND};
//! use conflux::infrastructure::graph::{register_builtin_factories, ServiceGraph};
//! use std::sync::Arc;
//!
//! # async fn demo() -> conflux::domain::error::Result<()> {
//! let graph = Arc::new(ServiceGraph::new());
//! register_builtin_factories(&graph);
//! graph.register(
//!     DEFAULT_CACHE_BACKEND,
//!     &serde_json::json!({ "()": "memory_cache", "max_entries": 10_000 }),
//! )?;
//!
//! let layer = CacheLayer::new(graph);
//! let key = CallKey::new("users.load").arg(serde_json::json!(42));
//! let user: String = layer
//!     .get_or_compute(&key, DEFAULT_CACHE_BACKEND, None, || async {
//!         Ok("alice".to_string())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `domain` - error taxonomy, call identity, port traits
//! - `providers` - cache backend and coder implementations
//! - `infrastructure` - the runtime proper: bounded channel,
//!   single-flight coalescer, cache layer, service graph

/// Domain layer - errors, call keys and port traits
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use conflux_domain::*;
}

/// Provider implementations - cache backends and coders
///
/// Re-exports from the providers crate for convenience
pub mod providers {
    pub use conflux_providers::*;
}

/// Infrastructure layer - channel, coalescer, cache layer, graph
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use conflux_infrastructure::*;
}

// Most-used types at the crate root
pub use conflux_domain::error::{Error, Result};
pub use conflux_domain::keys::CallKey;
pub use conflux_infrastructure::cache::CacheLayer;
pub use conflux_infrastructure::channel::BoundedChannel;
pub use conflux_infrastructure::graph::ServiceGraph;
pub use conflux_infrastructure::singleflight::SingleFlight;
