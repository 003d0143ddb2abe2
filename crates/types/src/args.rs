// Path: crates/types/src/args.rs

//! Typed named arguments for contract entry points.
//!
//! A [`NamedArgSet`] is an ordered mapping from argument name to a typed value.
//! It encodes canonically through [`crate::codec`] and renders to the
//! `name:type='value'` form accepted by the deploy submitter.

use crate::app::{PublicKey, URef};
use parity_scale_codec::{Decode, Encode};
use primitive_types::U512;
use std::fmt;

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum CLValue {
    /// An unsigned byte (e.g. a delegation rate).
    U8(u8),
    /// A 64-bit unsigned integer.
    U64(u64),
    /// A 512-bit unsigned integer (token amounts).
    U512(U512),
    /// A UTF-8 string.
    String(String),
    /// An account public key.
    PublicKey(PublicKey),
    /// A purse reference.
    URef(URef),
}

impl CLValue {
    /// The type name used in `name:type='value'` arguments.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U64(_) => "u64",
            Self::U512(_) => "u512",
            Self::String(_) => "string",
            Self::PublicKey(_) => "public_key",
            Self::URef(_) => "uref",
        }
    }

    /// Returns the URef if this value is one.
    pub fn as_uref(&self) -> Option<&URef> {
        match self {
            Self::URef(u) => Some(u),
            _ => None,
        }
    }

    /// Returns the U512 if this value is one.
    pub fn as_u512(&self) -> Option<&U512> {
        match self {
            Self::U512(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the string if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CLValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{}", v),
            Self::U512(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
            Self::PublicKey(v) => write!(f, "{}", v),
            Self::URef(v) => write!(f, "{}", v),
        }
    }
}

/// A single named argument.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct NamedArg {
    /// The argument name as the entry point declares it.
    pub name: String,
    /// The typed value.
    pub value: CLValue,
}

impl NamedArg {
    /// Renders the argument as `name:type='value'`.
    pub fn to_cli_arg(&self) -> String {
        format!("{}:{}='{}'", self.name, self.value.type_name(), self.value)
    }
}

/// An ordered set of named arguments. Names are unique; inserting an existing
/// name replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct NamedArgSet(Vec<NamedArg>);

impl NamedArgSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: CLValue) {
        let name = name.into();
        match self.0.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(NamedArg { name, value }),
        }
    }

    /// Builder-style [`NamedArgSet::insert`].
    pub fn with(mut self, name: impl Into<String>, value: CLValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Looks up a value by name.
    pub fn get(&self, name: &str) -> Option<&CLValue> {
        self.0.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Iterates the arguments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedArg> {
        self.0.iter()
    }

    /// The argument names in order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|a| a.name.as_str()).collect()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the set holds no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders every argument as `name:type='value'`.
    pub fn to_cli_args(&self) -> Vec<String> {
        self.0.iter().map(NamedArg::to_cli_arg).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AccessRights;

    #[test]
    fn insert_replaces_in_place() {
        let mut set = NamedArgSet::new()
            .with("amount", CLValue::U512(U512::from(1u64)))
            .with("delegation_rate", CLValue::U8(10));
        set.insert("amount", CLValue::U512(U512::from(5u64)));
        assert_eq!(set.names(), vec!["amount", "delegation_rate"]);
        assert_eq!(
            set.get("amount").and_then(CLValue::as_u512),
            Some(&U512::from(5u64))
        );
    }

    #[test]
    fn renders_client_arguments() {
        let purse = URef::new([1; 32], AccessRights::READ_ADD_WRITE);
        let set = NamedArgSet::new()
            .with("source_purse", CLValue::URef(purse))
            .with("amount", CLValue::U512(U512::from(1_000_000_000u64)))
            .with("delegation_rate", CLValue::U8(10));
        let rendered = set.to_cli_args();
        assert_eq!(rendered[0], format!("source_purse:uref='{}'", purse));
        assert_eq!(rendered[1], "amount:u512='1000000000'");
        assert_eq!(rendered[2], "delegation_rate:u8='10'");
    }
}
