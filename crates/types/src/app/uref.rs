// Path: crates/types/src/app/uref.rs

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Access bits carried by a URef (`READ = 1`, `WRITE = 2`, `ADD = 4`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Encode, Decode)]
pub struct AccessRights(pub u8);

impl AccessRights {
    /// Read access.
    pub const READ: Self = Self(0b001);
    /// Full read/add/write access, as granted to a purse's owner.
    pub const READ_ADD_WRITE: Self = Self(0b111);
}

/// An unforgeable reference to a chain-side value container (a purse).
///
/// Formatted as `uref-<64 hex>-<3 octal digits>`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct URef {
    addr: [u8; 32],
    access: AccessRights,
}

impl URef {
    const PREFIX: &'static str = "uref-";

    /// Builds a URef from its address and access bits.
    pub fn new(addr: [u8; 32], access: AccessRights) -> Self {
        Self { addr, access }
    }

    /// The 32-byte address.
    pub fn addr(&self) -> [u8; 32] {
        self.addr
    }

    /// The access bits.
    pub fn access_rights(&self) -> AccessRights {
        self.access
    }

    /// The formatted form understood by nodes and `casper-client`.
    pub fn to_formatted_string(&self) -> String {
        format!(
            "{}{}-{:03o}",
            Self::PREFIX,
            hex::encode(self.addr),
            self.access.0
        )
    }
}

impl fmt::Display for URef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_formatted_string())
    }
}

impl fmt::Debug for URef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "URef({})", self.to_formatted_string())
    }
}

impl FromStr for URef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .trim()
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| format!("URef must start with '{}'", Self::PREFIX))?;
        let (addr_hex, rights) = body
            .rsplit_once('-')
            .ok_or_else(|| "URef is missing its access rights suffix".to_string())?;
        let addr: [u8; 32] = hex::decode(addr_hex)
            .map_err(|e| format!("invalid URef address: {}", e))?
            .try_into()
            .map_err(|v: Vec<u8>| format!("URef address must be 32 bytes, got {}", v.len()))?;
        let access = u8::from_str_radix(rights, 8)
            .ok()
            .filter(|bits| *bits <= 0b111)
            .ok_or_else(|| format!("invalid URef access rights '{}'", rights))?;
        Ok(Self::new(addr, AccessRights(access)))
    }
}

impl Serialize for URef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_formatted_string())
    }
}

impl<'de> Deserialize<'de> for URef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_octal_access_rights() {
        let uref = URef::new([0x0f; 32], AccessRights::READ_ADD_WRITE);
        let s = uref.to_string();
        assert_eq!(s, format!("uref-{}-007", "0f".repeat(32)));
        assert_eq!(s.parse::<URef>().unwrap(), uref);
    }

    #[test]
    fn rejects_malformed_urefs() {
        assert!("hash-00".parse::<URef>().is_err());
        assert!(format!("uref-{}", "00".repeat(32)).parse::<URef>().is_err());
        assert!(format!("uref-{}-009", "00".repeat(32)).parse::<URef>().is_err());
        assert!("uref-abcd-007".parse::<URef>().is_err());
    }
}
