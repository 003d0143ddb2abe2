// Path: crates/client/src/node.rs

use crate::rpc::JsonRpcClient;
use crate::submit::CasperClientSubmitter;
use crate::{ChainQuery, DeploySubmitter, NodeClient, NodeConnector};
use async_trait::async_trait;
use netctl_types::app::{
    AccountHash, AccountRecord, AuctionState, BlockHash, BlockSummary, DeployHash, DeployRequest,
    ExecutionOutcome, NodeEndpoint, NodeStatus, StateRootHash, URef,
};
use netctl_types::error::RemoteError;
use netctl_types::U512;
use std::sync::Arc;
use std::time::Duration;

/// A live node: queries go over JSON-RPC, deploys through the submitter binary.
pub struct RemoteNode {
    endpoint: NodeEndpoint,
    rpc: JsonRpcClient,
    submitter: CasperClientSubmitter,
}

impl RemoteNode {
    pub fn new(endpoint: NodeEndpoint, rpc: JsonRpcClient, submitter: CasperClientSubmitter) -> Self {
        Self {
            endpoint,
            rpc,
            submitter,
        }
    }

    pub fn endpoint(&self) -> &NodeEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl ChainQuery for RemoteNode {
    async fn get_status(&self) -> Result<NodeStatus, RemoteError> {
        self.rpc.get_status().await
    }

    async fn get_block_by_height(&self, height: u64) -> Result<Option<BlockSummary>, RemoteError> {
        self.rpc.get_block_by_height(height).await
    }

    async fn get_block_by_hash(
        &self,
        hash: &BlockHash,
    ) -> Result<Option<BlockSummary>, RemoteError> {
        self.rpc.get_block_by_hash(hash).await
    }

    async fn get_account(
        &self,
        root: &StateRootHash,
        account: &AccountHash,
    ) -> Result<Option<AccountRecord>, RemoteError> {
        self.rpc.get_account(root, account).await
    }

    async fn get_balance(
        &self,
        root: &StateRootHash,
        purse: &URef,
    ) -> Result<Option<U512>, RemoteError> {
        self.rpc.get_balance(root, purse).await
    }

    async fn get_execution_outcome(
        &self,
        deploy: &DeployHash,
    ) -> Result<Option<ExecutionOutcome>, RemoteError> {
        self.rpc.get_execution_outcome(deploy).await
    }

    async fn get_auction_state(
        &self,
        block: &BlockHash,
    ) -> Result<Option<AuctionState>, RemoteError> {
        self.rpc.get_auction_state(block).await
    }
}

#[async_trait]
impl DeploySubmitter for RemoteNode {
    async fn submit(&self, deploy: &DeployRequest) -> Result<DeployHash, RemoteError> {
        self.submitter.submit(deploy).await
    }
}

/// Connects to nodes over HTTP, sharing one submitter binary and timeout.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client_bin: String,
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(client_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client_bin: client_bin.into(),
            timeout,
        }
    }
}

impl NodeConnector for HttpConnector {
    fn connect(&self, endpoint: &NodeEndpoint) -> Result<Arc<dyn NodeClient>, RemoteError> {
        let rpc = JsonRpcClient::new(endpoint.rpc_url(), self.timeout)?;
        let submitter =
            CasperClientSubmitter::new(&self.client_bin, &endpoint.rpc_address, self.timeout);
        let node: Arc<dyn NodeClient> = Arc::new(RemoteNode::new(endpoint.clone(), rpc, submitter));
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netctl_types::app::{NetworkId, NodeId};

    #[tokio::test]
    async fn unreachable_node_reports_transport_error() {
        let endpoint = NodeEndpoint {
            network: NetworkId(1),
            node: NodeId(1),
            // Port 9 (discard) is closed on any sane test host.
            rpc_address: "http://127.0.0.1:9".into(),
        };
        let node = HttpConnector::new("casper-client", Duration::from_secs(2))
            .connect(&endpoint)
            .unwrap();
        let err = node.get_status().await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Transport(_) | RemoteError::Timeout(_)
        ));
    }
}
