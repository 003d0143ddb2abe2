// Path: crates/cli/src/topology.rs

//! Network topology: which nodes (and how many user accounts) each local
//! network has, and where each node can be reached.
//!
//! Counts are taken from the `[[networks]]` entries of the configuration and,
//! for networks the configuration does not mention, discovered from the assets
//! tree (`<assets>/net-<n>/nodes/node-<k>/`). The node set of a network is the
//! dense range `1..=N` and does not change once the topology is built.

use netctl_types::app::{AccountSelector, AccountType, NetworkId, NodeEndpoint, NodeId, NodeTarget};
use netctl_types::config::{rpc_address, NetctlConfig, NetworkEntry};
use netctl_types::error::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;

/// The resolved set of networks.
#[derive(Debug, Clone)]
pub struct Topology {
    networks: BTreeMap<NetworkId, NetworkEntry>,
    node_host: String,
    base_rpc_port: u16,
}

impl Topology {
    /// A topology holding only the networks recorded in `config`.
    pub fn from_config(config: &NetctlConfig) -> Self {
        Self {
            networks: config
                .networks
                .iter()
                .map(|entry| (entry.id, entry.clone()))
                .collect(),
            node_host: config.node_host.clone(),
            base_rpc_port: config.base_rpc_port,
        }
    }

    /// The recorded networks plus any discovered under `config.assets_dir`.
    /// Recorded entries win over discovered ones.
    pub fn discover(config: &NetctlConfig) -> Result<Self, ConfigError> {
        let mut topology = Self::from_config(config);
        for entry in scan_assets(&config.assets_dir)? {
            topology.networks.entry(entry.id).or_insert(entry);
        }
        log::debug!(
            "Resolved {} network(s) from config and {}",
            topology.networks.len(),
            config.assets_dir.display()
        );
        Ok(topology)
    }

    /// Records (or replaces) a network.
    pub fn with_network(mut self, id: NetworkId, nodes: u32, users: u32) -> Self {
        self.networks.insert(id, NetworkEntry { id, nodes, users });
        self
    }

    /// All known networks, in id order.
    pub fn networks(&self) -> impl Iterator<Item = &NetworkEntry> {
        self.networks.values()
    }

    fn entry(&self, network: NetworkId) -> Result<&NetworkEntry, ConfigError> {
        self.networks
            .get(&network)
            .filter(|entry| entry.nodes > 0)
            .ok_or(ConfigError::UnknownNetwork(network))
    }

    /// The node count `N` of `network`.
    pub fn node_count(&self, network: NetworkId) -> Result<u32, ConfigError> {
        Ok(self.entry(network)?.nodes)
    }

    /// The number of provisioned user accounts of `network`.
    pub fn user_count(&self, network: NetworkId) -> Result<u32, ConfigError> {
        Ok(self.entry(network)?.users)
    }

    /// Every node of `network`, ascending: `1..=N`.
    pub fn resolve_nodes(&self, network: NetworkId) -> Result<Vec<NodeId>, ConfigError> {
        let n = self.node_count(network)?;
        Ok((1..=n).map(NodeId).collect())
    }

    /// The single node `{node}` of `network`, if it lies in `1..=N`.
    pub fn resolve_node(&self, network: NetworkId, node: NodeId) -> Result<Vec<NodeId>, ConfigError> {
        let n = self.node_count(network)?;
        if node.0 == 0 || node.0 > n {
            return Err(ConfigError::UnknownNode { network, node });
        }
        Ok(vec![node])
    }

    /// Expands a node target.
    pub fn resolve(&self, network: NetworkId, target: NodeTarget) -> Result<Vec<NodeId>, ConfigError> {
        match target {
            NodeTarget::All => self.resolve_nodes(network),
            NodeTarget::One(node) => self.resolve_node(network, node),
        }
    }

    /// Checks that `selector` names a provisioned account of `network`: the
    /// faucet is index 1 only, node accounts are `1..=N`, users `1..=U`.
    pub fn validate_selector(
        &self,
        network: NetworkId,
        selector: &AccountSelector,
    ) -> Result<(), ConfigError> {
        let upper = match selector.account_type {
            AccountType::Faucet => 1,
            AccountType::Node => self.node_count(network)?,
            AccountType::User => self.user_count(network)?,
        };
        if selector.index == 0 || selector.index > upper {
            return Err(ConfigError::InvalidAccountSelector(format!(
                "{} is not provisioned in {} ({} index must be in 1..={})",
                selector, network, selector.account_type, upper
            )));
        }
        Ok(())
    }

    /// The endpoint of a node, validated against the topology.
    pub fn endpoint(&self, network: NetworkId, node: NodeId) -> Result<NodeEndpoint, ConfigError> {
        self.resolve_node(network, node)?;
        Ok(NodeEndpoint {
            network,
            node,
            rpc_address: rpc_address(&self.node_host, self.base_rpc_port, network, node)?,
        })
    }
}

/// Reads `net-<n>` directories under `root`. A missing root yields nothing.
fn scan_assets(root: &Path) -> Result<Vec<NetworkEntry>, ConfigError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let read = std::fs::read_dir(root).map_err(|e| ConfigError::MissingAsset {
        path: root.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut entries = Vec::new();
    for dir in read.flatten() {
        let name = dir.file_name();
        let Some(id) = name
            .to_str()
            .and_then(|n| n.strip_prefix("net-"))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };
        let net_dir = dir.path();
        let nodes = count_contiguous(&net_dir.join("nodes"), "node-");
        if nodes == 0 {
            log::warn!("{} has no node directories; skipping", net_dir.display());
            continue;
        }
        entries.push(NetworkEntry {
            id: NetworkId(id),
            nodes,
            users: count_contiguous(&net_dir.join("users"), "user-"),
        });
    }
    Ok(entries)
}

/// Counts `<prefix>1`, `<prefix>2`, ... until the first gap.
fn count_contiguous(dir: &Path, prefix: &str) -> u32 {
    let mut n = 0;
    while dir.join(format!("{}{}", prefix, n + 1)).is_dir() {
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn topology() -> Topology {
        Topology::from_config(&NetctlConfig::default()).with_network(NetworkId(1), 5, 10)
    }

    #[test]
    fn all_nodes_is_the_dense_range() {
        let nodes = topology().resolve_nodes(NetworkId(1)).unwrap();
        assert_eq!(nodes, (1..=5).map(NodeId).collect::<Vec<_>>());
    }

    #[test]
    fn single_node_must_be_in_range() {
        let t = topology();
        assert_eq!(t.resolve_node(NetworkId(1), NodeId(3)).unwrap(), vec![NodeId(3)]);
        assert_eq!(
            t.resolve_node(NetworkId(1), NodeId(6)).unwrap_err(),
            ConfigError::UnknownNode {
                network: NetworkId(1),
                node: NodeId(6)
            }
        );
        assert!(t.resolve_node(NetworkId(1), NodeId(0)).is_err());
    }

    #[test]
    fn unrecorded_network_is_unknown() {
        let t = topology();
        assert_eq!(
            t.resolve_nodes(NetworkId(2)).unwrap_err(),
            ConfigError::UnknownNetwork(NetworkId(2))
        );
        assert_eq!(
            t.resolve(NetworkId(2), NodeTarget::One(NodeId(1))).unwrap_err(),
            ConfigError::UnknownNetwork(NetworkId(2))
        );
    }

    #[test]
    fn selector_ranges_per_account_type() {
        let t = topology();
        let net = NetworkId(1);
        assert!(t.validate_selector(net, &AccountSelector::faucet()).is_ok());
        assert!(t.validate_selector(net, &AccountSelector::node(NodeId(5))).is_ok());
        assert!(t.validate_selector(net, &AccountSelector::user(10)).is_ok());

        let bad = [
            AccountSelector {
                account_type: AccountType::Faucet,
                index: 2,
            },
            AccountSelector::node(NodeId(6)),
            AccountSelector::user(11),
            AccountSelector::user(0),
        ];
        for selector in bad {
            assert!(matches!(
                t.validate_selector(net, &selector),
                Err(ConfigError::InvalidAccountSelector(_))
            ));
        }
    }

    #[test]
    fn endpoint_port_follows_network_and_node() {
        let endpoint = topology().endpoint(NetworkId(1), NodeId(4)).unwrap();
        assert_eq!(endpoint.rpc_address, "http://127.0.0.1:11104");
        assert_eq!(endpoint.rpc_url(), "http://127.0.0.1:11104/rpc");
    }

    #[test]
    fn endpoint_past_the_port_range_is_rejected() {
        let t = topology().with_network(NetworkId(600), 2, 0);
        assert!(t.resolve_nodes(NetworkId(600)).is_ok());
        assert!(matches!(
            t.endpoint(NetworkId(600), NodeId(1)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn discovers_networks_from_assets() {
        let dir = tempfile::tempdir().unwrap();
        for k in [1, 2, 3, 5] {
            fs::create_dir_all(dir.path().join(format!("net-2/nodes/node-{}", k))).unwrap();
        }
        fs::create_dir_all(dir.path().join("net-2/users/user-1")).unwrap();
        fs::create_dir_all(dir.path().join("not-a-net")).unwrap();

        let config = NetctlConfig {
            assets_dir: dir.path().to_path_buf(),
            ..NetctlConfig::default()
        };
        let t = Topology::discover(&config).unwrap();
        // node-5 is past the gap at node-4
        assert_eq!(t.node_count(NetworkId(2)).unwrap(), 3);
        assert_eq!(t.user_count(NetworkId(2)).unwrap(), 1);
        assert_eq!(t.networks().count(), 1);
    }

    #[test]
    fn recorded_entry_overrides_discovery() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("net-1/nodes/node-1")).unwrap();
        let config = NetctlConfig {
            assets_dir: dir.path().to_path_buf(),
            networks: vec![NetworkEntry {
                id: NetworkId(1),
                nodes: 4,
                users: 2,
            }],
            ..NetctlConfig::default()
        };
        assert_eq!(Topology::discover(&config).unwrap().node_count(NetworkId(1)).unwrap(), 4);
    }
}
