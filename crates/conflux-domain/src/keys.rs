//! Call identity and fingerprint derivation
//!
//! A [`CallKey`] names one logical call: a scope (function identity)
//! plus its positional and keyword arguments. Its fingerprint is the
//! deterministic short string used as both coalescing key and cache
//! key, so the same logical call always lands in the same coalescing
//! window and cache slot.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Longest encoded key stored verbatim; anything longer is hashed
pub const MAX_PLAIN_KEY_LEN: usize = 32;

/// Identity of a logical call
///
/// Keyword arguments are kept in a `BTreeMap` so their encoding is
/// order-normalized: inserting them in any order yields the same
/// fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct CallKey {
    scope: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    args: Vec<Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    kwargs: BTreeMap<String, Value>,
}

impl CallKey {
    /// Create a key for the given call scope (usually a function path)
    pub fn new<S: Into<String>>(scope: S) -> Self {
        Self {
            scope: scope.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    /// Add a keyword argument
    pub fn kwarg<S: Into<String>>(mut self, name: S, value: Value) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }

    /// The call scope this key was created with
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Derive the storage fingerprint for this call
    ///
    /// The key is canonically serialized; if the encoded form is longer
    /// than [`MAX_PLAIN_KEY_LEN`] or contains characters unsafe for a
    /// storage key it is replaced by a fixed-width 128-bit hash of
    /// itself.
    pub fn fingerprint(&self) -> Result<String> {
        let encoded = serde_json::to_string(self)?;
        Ok(normalize_key(&encoded))
    }
}

/// Turn an arbitrary caller-supplied key into a storage-safe fingerprint
///
/// Short keys made of storage-safe characters pass through unchanged so
/// they stay readable in backend tooling; everything else becomes the
/// hex form of the first 128 bits of its SHA-256 digest.
pub fn normalize_key(raw: &str) -> String {
    if raw.len() <= MAX_PLAIN_KEY_LEN && raw.chars().all(storage_safe) {
        raw.to_string()
    } else {
        let digest = Sha256::digest(raw.as_bytes());
        hex::encode(&digest[..16])
    }
}

fn storage_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_is_stable() {
        let a = CallKey::new("users.load").arg(json!(42)).fingerprint().unwrap();
        let b = CallKey::new("users.load").arg(json!(42)).fingerprint().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_changes_with_arguments() {
        let a = CallKey::new("users.load").arg(json!(42)).fingerprint().unwrap();
        let b = CallKey::new("users.load").arg(json!(43)).fingerprint().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn kwarg_order_does_not_matter() {
        let a = CallKey::new("search")
            .kwarg("limit", json!(10))
            .kwarg("offset", json!(5))
            .fingerprint()
            .unwrap();
        let b = CallKey::new("search")
            .kwarg("offset", json!(5))
            .kwarg("limit", json!(10))
            .fingerprint()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn short_safe_keys_pass_through() {
        assert_eq!(normalize_key("user:42"), "user:42");
    }

    #[test]
    fn long_or_unsafe_keys_are_hashed() {
        let long = "x".repeat(64);
        let hashed = normalize_key(&long);
        assert_eq!(hashed.len(), 32);
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));
        // stable across calls
        assert_eq!(hashed, normalize_key(&long));

        let unsafe_key = normalize_key("a key.with spaces");
        assert_eq!(unsafe_key.len(), 32);
    }
}
