//! Cache backend implementations

mod memory;
mod null;

pub use memory::MemoryCacheBackend;
pub use null::NullCacheBackend;
