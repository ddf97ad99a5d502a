//! Value coder port

use crate::error::Result;
use serde_json::Value;

/// Encodes values to the byte payloads handed to cache backends
///
/// Implementations must be deterministic: identical logical values have
/// to produce identical encodings, since encoded forms participate in
/// key derivation.
pub trait Coder: Send + Sync {
    /// Encode a value into bytes
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decode bytes back into a value
    fn decode(&self, bytes: &[u8]) -> Result<Value>;

    /// Identifier of this coder implementation
    fn coder_name(&self) -> &str;
}
