// Path: crates/types/src/app/mod.rs

//! Core application-level data structures: network and node identifiers,
//! account selectors, public keys, purse handles and the chain records read
//! back from a node.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod chain;
mod hash;
mod keys;
mod uref;

pub use chain::*;
pub use hash::{BlockHash, DeployHash, Digest, StateRootHash};
pub use keys::{AccountHash, PublicKey};
pub use uref::{AccessRights, URef};

/// Identifies a local test network (`net-<id>` in the assets tree).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NetworkId(pub u32);

impl Default for NetworkId {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u32> for NetworkId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net-{}", self.0)
    }
}

/// Identifies a node within a network. Node ids are dense and 1-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl Default for NodeId {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Selects either every node of a network or a single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTarget {
    /// Every node `1..=N` of the network.
    All,
    /// A single node.
    One(NodeId),
}

impl FromStr for NodeTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<u32>()
            .map(|n| Self::One(NodeId(n)))
            .map_err(|_| format!("expected a node number or 'all', got '{}'", s))
    }
}

/// The closed set of account kinds a test network provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// The network's single funding account.
    Faucet,
    /// A node's validator/operator account.
    Node,
    /// A test user account.
    User,
}

impl AccountType {
    /// The directory/selector name of this account type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faucet => "faucet",
            Self::Node => "node",
            Self::User => "user",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "faucet" => Ok(Self::Faucet),
            "node" | "validator" => Ok(Self::Node),
            "user" => Ok(Self::User),
            other => Err(ConfigError::InvalidAccountSelector(format!(
                "unknown account type '{}'",
                other
            ))),
        }
    }
}

/// Addresses one account of a network: its type plus its 1-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountSelector {
    /// The account kind.
    pub account_type: AccountType,
    /// The 1-based index within that kind (always 1 for the faucet).
    pub index: u32,
}

impl AccountSelector {
    /// The faucet account.
    pub fn faucet() -> Self {
        Self {
            account_type: AccountType::Faucet,
            index: 1,
        }
    }

    /// The operator account of `node`.
    pub fn node(node: NodeId) -> Self {
        Self {
            account_type: AccountType::Node,
            index: node.0,
        }
    }

    /// The user account with the given index.
    pub fn user(index: u32) -> Self {
        Self {
            account_type: AccountType::User,
            index,
        }
    }
}

impl fmt::Display for AccountSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.account_type {
            AccountType::Faucet => f.write_str("faucet"),
            other => write!(f, "{}-{}", other, self.index),
        }
    }
}
