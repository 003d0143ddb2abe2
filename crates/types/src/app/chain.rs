// Path: crates/types/src/app/chain.rs

use super::{AccountHash, BlockHash, NetworkId, NodeId, PublicKey, StateRootHash, URef};
use crate::args::NamedArgSet;
use crate::codec::to_bytes_canonical;
use primitive_types::U512;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where a node of a local network can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEndpoint {
    /// The network the node belongs to.
    pub network: NetworkId,
    /// The node id within the network.
    pub node: NodeId,
    /// The JSON-RPC base address, e.g. `http://127.0.0.1:11101`.
    pub rpc_address: String,
}

impl NodeEndpoint {
    /// The JSON-RPC endpoint URL (`<rpc_address>/rpc`).
    pub fn rpc_url(&self) -> String {
        format!("{}/rpc", self.rpc_address.trim_end_matches('/'))
    }
}

/// The subset of a node's status this crate relies on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Height of the most recently added block, if the node has one.
    pub last_added_block_height: Option<u64>,
    /// Hash of the most recently added block, if the node has one.
    pub last_added_block_hash: Option<BlockHash>,
}

/// A block header reduced to the fields used for state queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// The block hash.
    pub hash: BlockHash,
    /// The block height.
    pub height: u64,
    /// The global state root after executing this block.
    pub state_root_hash: StateRootHash,
}

/// An account record read from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// The account hash the record is stored under.
    pub account_hash: AccountHash,
    /// The account's main purse.
    pub main_purse: URef,
    /// Named keys (name → formatted key) stored in the account.
    pub named_keys: BTreeMap<String, String>,
}

/// The execution result of a deploy once it has been included in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// The block that executed the deploy.
    pub block_hash: BlockHash,
    /// `None` on success, the execution engine's error message otherwise.
    pub error_message: Option<String>,
}

impl ExecutionOutcome {
    /// Returns `true` when the deploy executed without error.
    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }
}

/// The account that signs a deploy. Signing itself is performed by the
/// external submitter using `secret_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    /// The signer's public key.
    pub public_key: PublicKey,
    /// Path to the signer's PEM-encoded secret key.
    pub secret_key: PathBuf,
}

impl Signer {
    /// The signer's account hash.
    pub fn account_hash(&self) -> AccountHash {
        self.public_key.account_hash()
    }
}

/// The session code a deploy executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// An entry point of a contract already stored on chain.
    StoredContract {
        /// The formatted contract hash (`hash-<hex>`).
        contract_hash: String,
        /// The entry point to invoke.
        entry_point: String,
        /// The named arguments.
        args: NamedArgSet,
    },
    /// A wasm module shipped with the deploy.
    Wasm {
        /// Path to the module.
        path: PathBuf,
        /// The named arguments.
        args: NamedArgSet,
    },
}

impl Session {
    /// The named arguments of the session.
    pub fn args(&self) -> &NamedArgSet {
        match self {
            Self::StoredContract { args, .. } | Self::Wasm { args, .. } => args,
        }
    }

    /// A short label for logs: the entry point, or the wasm file stem.
    pub fn label(&self) -> String {
        match self {
            Self::StoredContract { entry_point, .. } => entry_point.clone(),
            Self::Wasm { path, .. } => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Everything needed to submit one deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// The chain name the deploy is valid for.
    pub chain_name: String,
    /// The signing account.
    pub signer: Signer,
    /// The session to execute.
    pub session: Session,
    /// Payment amount in motes.
    pub payment: U512,
    /// Gas price.
    pub gas_price: u64,
}

impl DeployRequest {
    /// The canonical byte encoding of the session's named arguments.
    ///
    /// Argument order is part of the encoding. In-process chains decode
    /// submitted arguments from these bytes.
    pub fn encoded_args(&self) -> Vec<u8> {
        to_bytes_canonical(self.session.args())
    }
}

fn serialize_motes<S: Serializer>(value: &U512, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// One delegator's stake behind a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegatorStake {
    /// The delegator's public key.
    pub public_key: PublicKey,
    /// Motes delegated.
    #[serde(serialize_with = "serialize_motes")]
    pub staked_amount: U512,
}

/// A validator's bid as recorded by the auction contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorBid {
    /// The validator's public key.
    pub public_key: PublicKey,
    /// The validator's own stake.
    #[serde(serialize_with = "serialize_motes")]
    pub staked_amount: U512,
    /// Percentage of delegator rewards kept by the validator.
    pub delegation_rate: u8,
    /// Whether the bid has been deactivated.
    pub inactive: bool,
    /// Stakes delegated to this validator.
    pub delegators: Vec<DelegatorStake>,
}

impl ValidatorBid {
    /// The stake `delegator` has behind this validator, if any.
    pub fn delegation(&self, delegator: &PublicKey) -> Option<U512> {
        self.delegators
            .iter()
            .find(|d| &d.public_key == delegator)
            .map(|d| d.staked_amount)
    }
}

/// The auction contract's bids as of one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuctionState {
    /// The state root the bids were read at.
    pub state_root_hash: StateRootHash,
    /// The height of the block.
    pub block_height: u64,
    /// Every bid, in the order the node returned them.
    pub bids: Vec<ValidatorBid>,
}

impl AuctionState {
    /// The bid of `validator`, if it has one.
    pub fn bid(&self, validator: &PublicKey) -> Option<&ValidatorBid> {
        self.bids.iter().find(|b| &b.public_key == validator)
    }
}
