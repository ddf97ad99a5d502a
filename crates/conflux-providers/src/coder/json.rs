//! JSON coder

use conflux_domain::error::Result;
use conflux_domain::ports::coder::Coder;
use serde_json::Value;

/// Default coder: compact JSON bytes
///
/// serde_json emits object keys in a stable order for a given value,
/// which keeps encodings comparable when they feed key derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCoder;

impl JsonCoder {
    /// Create a new JSON coder
    pub fn new() -> Self {
        Self
    }
}

impl Coder for JsonCoder {
    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn coder_name(&self) -> &str {
        "json"
    }
}
