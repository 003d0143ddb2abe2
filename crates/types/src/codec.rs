// Path: crates/types/src/codec.rs

//! Defines the canonical, deterministic binary codec for named-argument sets
//! and the other values netctl hands to a contract.
//!
//! This module provides thin wrappers around `parity-scale-codec` (SCALE). By
//! centralizing the codec here, the builder, the submitter and the tests all
//! agree on one byte representation for the same argument set.

use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical SCALE byte representation.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Vec<u8> {
    v.encode()
}

/// Decodes a value from its canonical byte representation.
///
/// Fails on any trailing bytes or malformed input, returning a descriptive string.
pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*b).map_err(|e| format!("canonical decode failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AccessRights, PublicKey, URef};
    use crate::args::{CLValue, NamedArgSet};
    use primitive_types::U512;

    fn add_bid_args() -> NamedArgSet {
        NamedArgSet::new()
            .with("public_key", CLValue::PublicKey(PublicKey::Ed25519([9; 32])))
            .with(
                "source_purse",
                CLValue::URef(URef::new([3; 32], AccessRights::READ_ADD_WRITE)),
            )
            .with("amount", CLValue::U512(U512::from(1_000_000_000u64)))
            .with("delegation_rate", CLValue::U8(10))
    }

    #[test]
    fn test_named_args_encode_deterministically() {
        let a = to_bytes_canonical(&add_bid_args());
        let b = to_bytes_canonical(&add_bid_args());
        assert!(!a.is_empty());
        assert_eq!(a, b);

        let decoded = from_bytes_canonical::<NamedArgSet>(&a).unwrap();
        assert_eq!(decoded, add_bid_args());
    }

    #[test]
    fn test_argument_order_is_part_of_the_encoding() {
        let reordered = NamedArgSet::new()
            .with("amount", CLValue::U512(U512::from(1_000_000_000u64)))
            .with("public_key", CLValue::PublicKey(PublicKey::Ed25519([9; 32])));
        let original = NamedArgSet::new()
            .with("public_key", CLValue::PublicKey(PublicKey::Ed25519([9; 32])))
            .with("amount", CLValue::U512(U512::from(1_000_000_000u64)));
        assert_ne!(
            to_bytes_canonical(&reordered),
            to_bytes_canonical(&original)
        );
    }

    #[test]
    fn test_canonical_decode_failure() {
        let mut encoded = to_bytes_canonical(&add_bid_args());
        encoded.pop();
        encoded.pop();

        let result = from_bytes_canonical::<NamedArgSet>(&encoded);
        let error_msg = result.unwrap_err();
        assert!(error_msg.contains("canonical decode failed"));
    }
}
