//! Domain layer for Conflux - core types and port traits
//!
//! Holds everything the rest of the workspace agrees on: the error
//! taxonomy, the call-identity/fingerprint types used as cache and
//! coalescing keys, and the narrow ports implemented by providers.

pub mod error;
pub mod keys;
pub mod ports;

pub use error::{Error, Result};
pub use keys::CallKey;
