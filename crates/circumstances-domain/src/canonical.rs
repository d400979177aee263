//! Canonical JSON and content hashing
//!
//! The canonical form sorts object keys at every depth and carries no
//! insignificant whitespace. `serde_json::Map` is a `BTreeMap` unless the
//! `preserve_order` feature is enabled, so the workspace must not enable it.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Payload could not be serialized for hashing
#[derive(Error, Debug)]
#[error("Failed to serialize payload for hashing: {0}")]
pub struct HashError(#[from] serde_json::Error);

/// Serialize `value` to canonical JSON bytes
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    // Round-trip through Value so struct field order never leaks into the output
    let value: Value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&value)?)
}

/// Lowercase hex SHA-256 of the canonical JSON form of `value`
///
/// # Examples
///
/// ```
/// use circumstances_domain::content_hash;
/// use serde_json::json;
///
/// let a = content_hash(&json!({"b": 1, "a": 2})).unwrap();
/// let b = content_hash(&json!({"a": 2, "b": 1})).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, HashError> {
    let bytes = canonical_json(value)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_at_every_depth() {
        let value = json!({"z": {"y": 1, "x": [ {"b": 2, "a": 1} ]}, "a": null});
        let bytes = canonical_json(&value).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":null,"z":{"x":[{"a":1,"b":2}],"y":1}}"#
        );
    }

    #[test]
    fn test_known_digest() {
        // sha256("{}")
        assert_eq!(
            content_hash(&json!({})).unwrap(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_different_content_different_hash() {
        let a = content_hash(&json!({"dateOfClaim": "2024-01-01"})).unwrap();
        let b = content_hash(&json!({"dateOfClaim": "2024-01-02"})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_struct_and_map_agree() {
        #[derive(Serialize)]
        struct Doc {
            zeta: u8,
            alpha: u8,
        }

        let from_struct = content_hash(&Doc { zeta: 1, alpha: 2 }).unwrap();
        let from_map = content_hash(&json!({"alpha": 2, "zeta": 1})).unwrap();
        assert_eq!(from_struct, from_map);
    }
}
