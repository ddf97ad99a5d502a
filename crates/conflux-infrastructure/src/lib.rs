//! Infrastructure layer for Conflux
//!
//! The coalescing cache runtime proper: the bounded channel primitive,
//! the single-flight coalescer built on top of it, the get-or-compute
//! cache layer, and the service graph that wires cache backends (and
//! every other shared component) together from declarative
//! configuration.

pub mod cache;
pub mod channel;
pub mod config;
pub mod graph;
pub mod logging;
pub mod pool;
pub mod singleflight;
pub mod timing;

pub use cache::CacheLayer;
pub use channel::BoundedChannel;
pub use graph::ServiceGraph;
pub use singleflight::SingleFlight;
