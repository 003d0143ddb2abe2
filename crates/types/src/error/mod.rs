// Path: crates/types/src/error/mod.rs
//! Core error types for netctl.
//!
//! The taxonomy mirrors how failures must be told apart by callers:
//! configuration problems, request validation problems (always raised before
//! any remote call), remote failures identified by the step that produced them,
//! and partial failures of an "all nodes" fan-out.

use crate::app::{NetworkId, NodeId};
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors in the static description of networks, nodes and accounts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The network has no recorded node count.
    #[error("Unknown network: {0}")]
    UnknownNetwork(NetworkId),
    /// The node id lies outside the network's `1..=N` node range.
    #[error("Unknown node {node} in {network}")]
    UnknownNode {
        /// The network that was addressed.
        network: NetworkId,
        /// The node that does not exist in it.
        node: NodeId,
    },
    /// The account type / index combination is not provisioned.
    #[error("Invalid account selector: {0}")]
    InvalidAccountSelector(String),
    /// A key or wasm file expected in the assets tree is absent or unreadable.
    #[error("Missing asset {path}: {reason}")]
    MissingAsset {
        /// The path that was read.
        path: String,
        /// Why it could not be used.
        reason: String,
    },
    /// The configuration file could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownNetwork(_) => "CONFIG_UNKNOWN_NETWORK",
            Self::UnknownNode { .. } => "CONFIG_UNKNOWN_NODE",
            Self::InvalidAccountSelector(_) => "CONFIG_INVALID_ACCOUNT_SELECTOR",
            Self::MissingAsset { .. } => "CONFIG_MISSING_ASSET",
            Self::Invalid(_) => "CONFIG_INVALID",
        }
    }
}

/// Errors in a request's arguments. Raised before any remote call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent.
    #[error("Missing argument: {0}")]
    MissingArgument(String),
    /// A field is present but does not decode to its type.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// The field name.
        name: String,
        /// The decode failure.
        reason: String,
    },
    /// An amount that must be strictly positive is not.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument(_) => "VALIDATION_MISSING_ARGUMENT",
            Self::InvalidArgument { .. } => "VALIDATION_INVALID_ARGUMENT",
            Self::InvalidAmount(_) => "VALIDATION_INVALID_AMOUNT",
        }
    }
}

/// Failures of the read chain status → block → account → balance (or
/// status → block → auction), one variant per hop so callers can tell "chain unreachable" from "not yet visible".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The node status (latest block) could not be read.
    #[error("Node status unavailable: {0}")]
    StatusUnavailable(String),
    /// The block at the requested height/hash could not be read.
    #[error("Block not found: {0}")]
    BlockNotFound(String),
    /// The account is not present at the state root.
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    /// The purse balance is not present at the state root.
    #[error("Purse not found: {0}")]
    PurseNotFound(String),
    /// The auction contract's bids could not be read at the block.
    #[error("Auction state unavailable: {0}")]
    AuctionUnavailable(String),
    /// The auction holds no bid for the validator.
    #[error("Bid not found: {0}")]
    BidNotFound(String),
}

impl ErrorCode for QueryError {
    fn code(&self) -> &'static str {
        match self {
            Self::StatusUnavailable(_) => "QUERY_STATUS_UNAVAILABLE",
            Self::BlockNotFound(_) => "QUERY_BLOCK_NOT_FOUND",
            Self::AccountNotFound(_) => "QUERY_ACCOUNT_NOT_FOUND",
            Self::PurseNotFound(_) => "QUERY_PURSE_NOT_FOUND",
            Self::AuctionUnavailable(_) => "QUERY_AUCTION_UNAVAILABLE",
            Self::BidNotFound(_) => "QUERY_BID_NOT_FOUND",
        }
    }
}

/// Failures reported by, or while talking to, a node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response (connection, HTTP, process spawn).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The request exceeded its time bound.
    #[error("Timed out: {0}")]
    Timeout(String),
    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },
    /// The response did not have the documented shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// The host rejected the creation of a new purse.
    #[error("Purse creation failed: {0}")]
    PurseCreationFailed(String),
    /// A purse-to-purse transfer failed; the message is the host's, verbatim.
    #[error("Transfer failed: {0}")]
    Transfer(String),
    /// The node refused the deploy.
    #[error("Deploy submission failed: {0}")]
    Submission(String),
    /// A system contract could not be resolved by its named key.
    #[error("Contract not found: {0}")]
    ContractNotFound(String),
}

impl ErrorCode for RemoteError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "REMOTE_TRANSPORT",
            Self::Timeout(_) => "REMOTE_TIMEOUT",
            Self::Rpc { .. } => "REMOTE_RPC",
            Self::Malformed(_) => "REMOTE_MALFORMED_RESPONSE",
            Self::PurseCreationFailed(_) => "REMOTE_PURSE_CREATION_FAILED",
            Self::Transfer(_) => "REMOTE_TRANSFER_FAILED",
            Self::Submission(_) => "REMOTE_SUBMISSION_FAILED",
            Self::ContractNotFound(_) => "REMOTE_CONTRACT_NOT_FOUND",
        }
    }
}

/// The crate-wide error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetctlError {
    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// See [`ValidationError`].
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// See [`QueryError`].
    #[error(transparent)]
    Query(#[from] QueryError),
    /// See [`RemoteError`].
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// Some units of an "all nodes" fan-out failed while others succeeded.
    #[error("{failed} of {total} nodes failed")]
    PartialBatchFailure {
        /// Number of failed nodes.
        failed: usize,
        /// Number of nodes addressed.
        total: usize,
    },
}

impl ErrorCode for NetctlError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Validation(e) => e.code(),
            Self::Query(e) => e.code(),
            Self::Remote(e) => e.code(),
            Self::PartialBatchFailure { .. } => "BATCH_PARTIAL_FAILURE",
        }
    }
}
