//! Provider implementations for Conflux
//!
//! Concrete implementations of the domain ports: cache backends (moka
//! in-memory, null) and the default JSON coder.

pub mod cache;
pub mod coder;

pub use cache::{MemoryCacheBackend, NullCacheBackend};
pub use coder::JsonCoder;
