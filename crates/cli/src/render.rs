// Path: crates/cli/src/render.rs

//! Per-node rendering of an account's on-chain state.
//!
//! Rendering is read-only. In "all nodes" mode every node is read by its own
//! task; a failing node never prevents the others from being reported, and
//! the batch as a whole fails with [`NetctlError::PartialBatchFailure`] once
//! every result is in.

use crate::assets::Assets;
use crate::topology::Topology;
use crate::verify::{account_at, balance_at, latest_state};
use netctl_client::{ChainQuery, NodeClient, NodeConnector};
use netctl_types::app::{
    AccountHash, AccountSelector, AccountType, NetworkId, NodeId, PublicKey, StateRootHash, URef,
};
use netctl_types::error::{NetctlError, RemoteError};
use netctl_types::U512;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Serializes motes as a decimal string.
pub fn serialize_motes<S: Serializer>(value: &U512, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// An account as seen by one node at one state root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub network: NetworkId,
    pub node: NodeId,
    pub account: AccountSelector,
    pub public_key: PublicKey,
    pub account_hash: AccountHash,
    pub main_purse: URef,
    #[serde(serialize_with = "serialize_motes")]
    pub balance: U512,
    pub named_keys: BTreeMap<String, String>,
    pub state_root_hash: StateRootHash,
    pub block_height: u64,
}

/// Per-node results of a fan-out, keyed and ordered by node id.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub results: BTreeMap<NodeId, Result<T, NetctlError>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            results: BTreeMap::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.results.values().filter(|r| r.is_err()).count()
    }

    pub fn successes(&self) -> impl Iterator<Item = (&NodeId, &T)> {
        self.results
            .iter()
            .filter_map(|(node, r)| r.as_ref().ok().map(|v| (node, v)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&NodeId, &NetctlError)> {
        self.results
            .iter()
            .filter_map(|(node, r)| r.as_ref().err().map(|e| (node, e)))
    }

    /// All values when every node succeeded, otherwise
    /// [`NetctlError::PartialBatchFailure`].
    pub fn into_outcome(self) -> Result<Vec<(NodeId, T)>, NetctlError> {
        let (failed, total) = (self.failed(), self.total());
        if failed > 0 {
            return Err(NetctlError::PartialBatchFailure { failed, total });
        }
        Ok(self
            .results
            .into_iter()
            .filter_map(|(node, r)| r.ok().map(|v| (node, v)))
            .collect())
    }
}

/// Reads `public_key`'s account from one node.
pub async fn read_account_view<C>(
    client: &C,
    network: NetworkId,
    node: NodeId,
    account: AccountSelector,
    public_key: PublicKey,
) -> Result<AccountView, NetctlError>
where
    C: ChainQuery + ?Sized,
{
    let account_hash = public_key.account_hash();
    let state = latest_state(client).await?;
    let record = account_at(client, &state, &account_hash).await?;
    let balance = balance_at(client, &state, &record.main_purse).await?;
    Ok(AccountView {
        network,
        node,
        account,
        public_key,
        account_hash,
        main_purse: record.main_purse,
        balance,
        named_keys: record.named_keys,
        state_root_hash: state.state_root_hash,
        block_height: state.block_height,
    })
}

/// Renders accounts from a network's nodes.
pub struct AccountRenderer<'a> {
    topology: &'a Topology,
    assets: &'a Assets,
    connector: &'a dyn NodeConnector,
}

impl<'a> AccountRenderer<'a> {
    pub fn new(topology: &'a Topology, assets: &'a Assets, connector: &'a dyn NodeConnector) -> Self {
        Self {
            topology,
            assets,
            connector,
        }
    }

    /// Renders `selector`'s account as seen by `node`.
    pub async fn render_account(
        &self,
        network: NetworkId,
        node: NodeId,
        selector: AccountSelector,
    ) -> Result<AccountView, NetctlError> {
        self.topology.validate_selector(network, &selector)?;
        let endpoint = self.topology.endpoint(network, node)?;
        let public_key = self.assets.public_key(network, &selector)?;
        let client = self.connector.connect(&endpoint)?;
        read_account_view(client.as_ref(), network, node, selector, public_key).await
    }

    /// Renders an account from every node of `network` in parallel.
    ///
    /// With `AccountType::Node` and no explicit index, each node renders its
    /// own operator account. Any other selector renders the same account from
    /// every node.
    pub async fn render_all(
        &self,
        network: NetworkId,
        account_type: AccountType,
        index: Option<u32>,
    ) -> Result<BatchReport<AccountView>, NetctlError> {
        let nodes = self.topology.resolve_nodes(network)?;
        let selector_for = |node: NodeId| match (account_type, index) {
            (AccountType::Node, None) => AccountSelector::node(node),
            (account_type, index) => AccountSelector {
                account_type,
                index: index.unwrap_or(1),
            },
        };
        for node in &nodes {
            self.topology.validate_selector(network, &selector_for(*node))?;
        }

        let mut report = BatchReport::default();
        let mut set = JoinSet::new();
        for node in &nodes {
            let node = *node;
            let selector = selector_for(node);
            match self.prepare_node(network, node, &selector) {
                Ok((client, public_key)) => {
                    set.spawn(async move {
                        let view =
                            read_account_view(client.as_ref(), network, node, selector, public_key)
                                .await;
                        (node, view)
                    });
                }
                Err(e) => {
                    report.results.insert(node, Err(e));
                }
            }
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((node, view)) => {
                    report.results.insert(node, view);
                }
                Err(e) => log::error!("Render task failed to join: {}", e),
            }
        }
        for node in nodes {
            report.results.entry(node).or_insert_with(|| {
                Err(RemoteError::Transport("render task did not complete".into()).into())
            });
        }

        for (node, err) in report.failures() {
            log::warn!("[{}/{}] render failed: {}", network, node, err);
        }
        log::info!(
            "Rendered {} of {} node(s) in {}",
            report.total() - report.failed(),
            report.total(),
            network
        );
        Ok(report)
    }

    fn prepare_node(
        &self,
        network: NetworkId,
        node: NodeId,
        selector: &AccountSelector,
    ) -> Result<(Arc<dyn NodeClient>, PublicKey), NetctlError> {
        let endpoint = self.topology.endpoint(network, node)?;
        let public_key = self.assets.public_key(network, selector)?;
        let client = self.connector.connect(&endpoint)?;
        Ok((client, public_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netctl_types::error::QueryError;

    #[test]
    fn outcome_reports_partial_failure_counts() {
        let mut report: BatchReport<u32> = BatchReport::default();
        report.results.insert(NodeId(1), Ok(1));
        report
            .results
            .insert(NodeId(2), Err(QueryError::StatusUnavailable("down".into()).into()));
        report.results.insert(NodeId(3), Ok(3));

        assert_eq!(report.successes().count(), 2);
        assert_eq!(report.failures().map(|(n, _)| *n).collect::<Vec<_>>(), vec![NodeId(2)]);
        assert_eq!(
            report.into_outcome().unwrap_err(),
            NetctlError::PartialBatchFailure {
                failed: 1,
                total: 3
            }
        );
    }

    #[test]
    fn clean_batch_yields_values_in_node_order() {
        let mut report: BatchReport<&str> = BatchReport::default();
        report.results.insert(NodeId(2), Ok("b"));
        report.results.insert(NodeId(1), Ok("a"));
        assert_eq!(
            report.into_outcome().unwrap(),
            vec![(NodeId(1), "a"), (NodeId(2), "b")]
        );
    }

    #[test]
    fn balance_serializes_as_decimal() {
        let view = AccountView {
            network: NetworkId(1),
            node: NodeId(1),
            account: AccountSelector::faucet(),
            public_key: PublicKey::Ed25519([1; 32]),
            account_hash: PublicKey::Ed25519([1; 32]).account_hash(),
            main_purse: format!("uref-{}-007", "01".repeat(32)).parse().unwrap(),
            balance: U512::from(1_000_000_000u64),
            named_keys: BTreeMap::new(),
            state_root_hash: StateRootHash::default(),
            block_height: 4,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["balance"], "1000000000");
        assert_eq!(json["account"]["account_type"], "faucet");
    }
}
