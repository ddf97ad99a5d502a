//! Ports implemented by provider crates

pub mod cache;
pub mod coder;

pub use cache::{CacheBackend, TTL_NO_EXPIRY};
pub use coder::Coder;
