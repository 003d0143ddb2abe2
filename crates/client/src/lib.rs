// Path: crates/client/src/lib.rs
//! # netctl Client Crate Lints
//!
//! This crate enforces a strict set of lints to ensure panic-free code.
//! Panics are disallowed in non-test code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # netctl Client
//!
//! The remote collaborators of the control plane: a key-addressed state query
//! interface and a deploy submission interface. Both are traits so the
//! orchestration in `netctl-cli` can be driven against a real node or an
//! in-memory chain.

use async_trait::async_trait;
use netctl_types::app::{
    AccountHash, AccountRecord, AuctionState, BlockHash, BlockSummary, DeployHash, DeployRequest,
    ExecutionOutcome, NodeEndpoint, NodeStatus, StateRootHash, URef,
};
use netctl_types::config::NetctlConfig;
use netctl_types::error::RemoteError;
use netctl_types::U512;
use std::sync::Arc;

pub mod node;
pub mod rpc;
pub mod submit;

pub use node::{HttpConnector, RemoteNode};
pub use rpc::JsonRpcClient;
pub use submit::CasperClientSubmitter;

/// Read access to a node's view of the chain.
///
/// Lookups return `Ok(None)` when the node answers that the item does not
/// exist, and `Err` when the node could not answer at all.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// The node's latest-added block.
    async fn get_status(&self) -> Result<NodeStatus, RemoteError>;

    /// The block at `height`.
    async fn get_block_by_height(&self, height: u64) -> Result<Option<BlockSummary>, RemoteError>;

    /// The block with `hash`.
    async fn get_block_by_hash(
        &self,
        hash: &BlockHash,
    ) -> Result<Option<BlockSummary>, RemoteError>;

    /// The account stored under `account` at `root`.
    async fn get_account(
        &self,
        root: &StateRootHash,
        account: &AccountHash,
    ) -> Result<Option<AccountRecord>, RemoteError>;

    /// The balance of `purse` at `root`.
    async fn get_balance(
        &self,
        root: &StateRootHash,
        purse: &URef,
    ) -> Result<Option<U512>, RemoteError>;

    /// The execution result of a deploy, once a block has executed it.
    async fn get_execution_outcome(
        &self,
        deploy: &DeployHash,
    ) -> Result<Option<ExecutionOutcome>, RemoteError>;

    /// The auction contract's bids as of the block with hash `block`.
    async fn get_auction_state(&self, block: &BlockHash)
        -> Result<Option<AuctionState>, RemoteError>;
}

/// Submission of signed deploys. Acceptance does not imply execution.
#[async_trait]
pub trait DeploySubmitter: Send + Sync {
    /// Submits `deploy`, returning the hash the node accepted it under.
    async fn submit(&self, deploy: &DeployRequest) -> Result<DeployHash, RemoteError>;
}

/// A node that can both answer queries and accept deploys.
pub trait NodeClient: ChainQuery + DeploySubmitter {}

impl<T: ChainQuery + DeploySubmitter> NodeClient for T {}

/// Produces a client for a node endpoint.
pub trait NodeConnector: Send + Sync {
    /// Connects to `endpoint`.
    fn connect(&self, endpoint: &NodeEndpoint) -> Result<Arc<dyn NodeClient>, RemoteError>;
}

/// Builds the production connector from configuration.
pub fn connector_from_config(config: &NetctlConfig) -> HttpConnector {
    HttpConnector::new(config.casper_client_bin.clone(), config.request_timeout())
}
