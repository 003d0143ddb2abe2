// Path: crates/types/src/config/mod.rs

//! Process-wide configuration, read from `netctl.toml`.
//!
//! Every value has a default so an absent file behaves like an empty one. The
//! `[defaults]` table is the fallback for fields a staking request leaves
//! unspecified; callers override it per request.

use crate::app::{NetworkId, NodeId};
use crate::error::ConfigError;
use crate::DEFAULT_STAKE_AMOUNT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetctlConfig {
    /// Root of the generated network assets (`net-<n>/...`).
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// Host every local node listens on.
    #[serde(default = "default_node_host")]
    pub node_host: String,
    /// Base RPC port; node `k` of network `n` listens on `base + n*100 + k`.
    #[serde(default = "default_base_rpc_port")]
    pub base_rpc_port: u16,
    /// Chain name prefix; network `n` is named `<prefix><n>`.
    #[serde(default = "default_chain_name_prefix")]
    pub chain_name_prefix: String,
    /// The deploy submitter binary.
    #[serde(default = "default_client_bin")]
    pub casper_client_bin: String,
    /// Upper bound for any single remote request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long to wait for a write deploy to execute.
    #[serde(default)]
    pub execution: ExecutionWaitConfig,
    /// Fallback values for staking requests.
    #[serde(default)]
    pub defaults: OperationDefaults,
    /// Named keys and session modules for system contracts.
    #[serde(default)]
    pub contracts: ContractsConfig,
    /// Recorded network topologies.
    #[serde(default)]
    pub networks: Vec<NetworkEntry>,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}
fn default_node_host() -> String {
    "127.0.0.1".to_string()
}
fn default_base_rpc_port() -> u16 {
    11000
}
fn default_chain_name_prefix() -> String {
    "casper-net-".to_string()
}
fn default_client_bin() -> String {
    "casper-client".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for NetctlConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            node_host: default_node_host(),
            base_rpc_port: default_base_rpc_port(),
            chain_name_prefix: default_chain_name_prefix(),
            casper_client_bin: default_client_bin(),
            request_timeout_secs: default_request_timeout_secs(),
            execution: ExecutionWaitConfig::default(),
            defaults: OperationDefaults::default(),
            contracts: ContractsConfig::default(),
            networks: Vec::new(),
        }
    }
}

impl NetctlConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Loads the configuration at `path`, or the defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Serializes the configuration as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// The chain name of `network`.
    pub fn chain_name(&self, network: NetworkId) -> String {
        format!("{}{}", self.chain_name_prefix, network.0)
    }

    /// The JSON-RPC base address of `node` in `network`.
    pub fn node_rpc_address(&self, network: NetworkId, node: NodeId) -> Result<String, ConfigError> {
        rpc_address(&self.node_host, self.base_rpc_port, network, node)
    }

    /// [`NetctlConfig::request_timeout_secs`] as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// The JSON-RPC base address of `node` in `network`: port
/// `base_rpc_port + network*100 + node` on `host`. Fails when the port does
/// not fit in 16 bits.
pub fn rpc_address(
    host: &str,
    base_rpc_port: u16,
    network: NetworkId,
    node: NodeId,
) -> Result<String, ConfigError> {
    let port = network
        .0
        .checked_mul(100)
        .and_then(|offset| offset.checked_add(node.0))
        .and_then(|offset| u16::try_from(offset).ok())
        .and_then(|offset| base_rpc_port.checked_add(offset))
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "RPC port of {} {} exceeds 65535 (base {})",
                network, node, base_rpc_port
            ))
        })?;
    Ok(format!("http://{}:{}", host, port))
}

/// Bounds for waiting on a deploy's execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionWaitConfig {
    /// Give up after this many seconds.
    #[serde(default = "default_wait_timeout_secs")]
    pub timeout_secs: u64,
    /// Poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_wait_timeout_secs() -> u64 {
    120
}
fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for ExecutionWaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_wait_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ExecutionWaitConfig {
    /// The overall wait bound.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The poll interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Fallback values for staking requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDefaults {
    /// Amount in motes.
    #[serde(default = "default_amount")]
    pub amount: u64,
    /// Payment amount in motes.
    #[serde(default = "default_gas_payment")]
    pub gas_payment: u64,
    /// Gas price.
    #[serde(default = "default_gas_price")]
    pub gas_price: u64,
    /// Network.
    #[serde(default)]
    pub net: NetworkId,
    /// Node.
    #[serde(default)]
    pub node: NodeId,
    /// User index.
    #[serde(default = "default_user")]
    pub user: u32,
}

fn default_amount() -> u64 {
    DEFAULT_STAKE_AMOUNT
}
fn default_gas_payment() -> u64 {
    10_000_000_000
}
fn default_gas_price() -> u64 {
    1
}
fn default_user() -> u32 {
    1
}

impl Default for OperationDefaults {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            gas_payment: default_gas_payment(),
            gas_price: default_gas_price(),
            net: NetworkId::default(),
            node: NodeId::default(),
            user: default_user(),
        }
    }
}

/// How system contracts and helper session modules are located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Named key of the auction contract on the faucet account.
    #[serde(default = "default_auction_key")]
    pub auction_named_key: String,
    /// Named key of the token contract on the faucet account.
    #[serde(default = "default_token_key")]
    pub token_named_key: String,
    /// Session module that creates a named purse (under `net-<n>/bin`).
    #[serde(default = "default_create_purse_wasm")]
    pub create_purse_wasm: String,
    /// Session module that moves motes between two purses (under `net-<n>/bin`).
    #[serde(default = "default_transfer_wasm")]
    pub transfer_wasm: String,
}

fn default_auction_key() -> String {
    "auction".to_string()
}
fn default_token_key() -> String {
    "erc20_token_contract".to_string()
}
fn default_create_purse_wasm() -> String {
    "create_purse_01.wasm".to_string()
}
fn default_transfer_wasm() -> String {
    "transfer_purse_to_purse.wasm".to_string()
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            auction_named_key: default_auction_key(),
            token_named_key: default_token_key(),
            create_purse_wasm: default_create_purse_wasm(),
            transfer_wasm: default_transfer_wasm(),
        }
    }
}

/// The recorded size of one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
    /// The network id.
    pub id: NetworkId,
    /// Node count; nodes are `1..=nodes`.
    pub nodes: u32,
    /// User account count; users are `1..=users`.
    #[serde(default)]
    pub users: u32,
}
