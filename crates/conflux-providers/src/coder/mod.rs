//! Coder implementations

mod json;

pub use json::JsonCoder;
