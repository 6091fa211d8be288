//! Canonical serialization for change detection.
//!
//! Dependency lists passed to `Registry::publish` and the content of a
//! rendered document are reduced to a stable xxh64 fingerprint so that
//! "did anything change" is a single integer comparison.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap allowed: Use BTreeMap for maps in fingerprinted data

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes.
///
/// Values that cannot be represented as JSON (maps with non-string keys)
/// produce an empty buffer, so they all fingerprint identically.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "value is not representable as canonical JSON");
            Vec::new()
        }
    }
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize + ?Sized>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_determinism() {
        let deps = ("/blog", 3_u32, vec!["rust", "web"]);
        assert_eq!(canonical_hash(&deps), canonical_hash(&deps));
    }

    #[test]
    fn test_different_values_differ() {
        assert_ne!(canonical_hash(&("en", 1)), canonical_hash(&("en", 2)));
    }

    #[test]
    fn test_unrepresentable_value_hashes_as_empty() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), "tuple keys are not JSON");
        assert!(to_canonical_bytes(&map).is_empty());
        assert_eq!(canonical_hash_hex(&map).len(), 16);
    }
}
