// Path: crates/types/src/app/keys.rs

use blake2::{digest::consts::U32, Blake2b, Digest as _};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

type Blake2b256 = Blake2b<U32>;

const ED25519_TAG: u8 = 0x01;
const SECP256K1_TAG: u8 = 0x02;

/// An account public key in its tagged form (`01` ed25519, `02` secp256k1).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub enum PublicKey {
    /// A 32-byte ed25519 key.
    Ed25519([u8; 32]),
    /// A 33-byte compressed secp256k1 key.
    Secp256k1([u8; 33]),
}

impl PublicKey {
    /// Parses the tag-prefixed hex form found in `public_key_hex` files.
    pub fn from_hex(input: &str) -> Result<Self, String> {
        let bytes = hex::decode(input.trim()).map_err(|e| format!("invalid hex: {}", e))?;
        let (tag, body) = bytes
            .split_first()
            .ok_or_else(|| "empty public key".to_string())?;
        match *tag {
            ED25519_TAG => body
                .try_into()
                .map(Self::Ed25519)
                .map_err(|_| format!("ed25519 key must be 32 bytes, got {}", body.len())),
            SECP256K1_TAG => body
                .try_into()
                .map(Self::Secp256k1)
                .map_err(|_| format!("secp256k1 key must be 33 bytes, got {}", body.len())),
            other => Err(format!("unknown key algorithm tag {:02x}", other)),
        }
    }

    /// The tag-prefixed hex form.
    pub fn to_hex(&self) -> String {
        let mut out = Vec::with_capacity(34);
        out.push(self.tag());
        out.extend_from_slice(self.raw());
        hex::encode(out)
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Ed25519(_) => ED25519_TAG,
            Self::Secp256k1(_) => SECP256K1_TAG,
        }
    }

    fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => "ed25519",
            Self::Secp256k1(_) => "secp256k1",
        }
    }

    fn raw(&self) -> &[u8] {
        match self {
            Self::Ed25519(k) => k,
            Self::Secp256k1(k) => k,
        }
    }

    /// Derives the account hash the chain indexes accounts by:
    /// `blake2b256(algorithm_name || 0x00 || key_bytes)`.
    pub fn account_hash(&self) -> AccountHash {
        let mut hasher = Blake2b256::new();
        hasher.update(self.algorithm_name().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.raw());
        AccountHash(hasher.finalize().into())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The hash under which an account is stored in global state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct AccountHash(pub [u8; 32]);

impl AccountHash {
    const PREFIX: &'static str = "account-hash-";

    /// The formatted state key, `account-hash-<hex>`.
    pub fn to_key_string(&self) -> String {
        format!("{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl fmt::Display for AccountHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key_string())
    }
}

impl fmt::Debug for AccountHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountHash({})", hex::encode(self.0))
    }
}

impl FromStr for AccountHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix(Self::PREFIX).unwrap_or(s);
        let bytes = hex::decode(body).map_err(|e| format!("invalid account hash: {}", e))?;
        bytes
            .try_into()
            .map(Self)
            .map_err(|v: Vec<u8>| format!("account hash must be 32 bytes, got {}", v.len()))
    }
}

impl Serialize for AccountHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_key_string())
    }
}

impl<'de> Deserialize<'de> for AccountHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_keys() {
        let ed = format!("01{}", "aa".repeat(32));
        let key = PublicKey::from_hex(&ed).unwrap();
        assert!(matches!(key, PublicKey::Ed25519(_)));
        assert_eq!(key.to_hex(), ed);

        let secp = format!("02{}", "bb".repeat(33));
        assert!(matches!(
            PublicKey::from_hex(&secp).unwrap(),
            PublicKey::Secp256k1(_)
        ));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(PublicKey::from_hex("").is_err());
        assert!(PublicKey::from_hex("01abcd").is_err());
        assert!(PublicKey::from_hex(&format!("03{}", "aa".repeat(32))).is_err());
        assert!(PublicKey::from_hex("not-hex").is_err());
    }

    #[test]
    fn account_hash_is_stable_and_algorithm_scoped() {
        let a = PublicKey::Ed25519([7; 32]);
        assert_eq!(a.account_hash(), a.account_hash());
        let mut secp = [7u8; 33];
        secp[0] = 2;
        assert_ne!(a.account_hash(), PublicKey::Secp256k1(secp).account_hash());
        let key = a.account_hash().to_key_string();
        assert!(key.starts_with("account-hash-"));
        assert_eq!(key.parse::<AccountHash>().unwrap(), a.account_hash());
    }
}
