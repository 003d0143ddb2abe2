// Path: crates/cli/src/commands/verify.rs

use super::Workspace;
use crate::util::{print_json, KvArgs};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netctl_cli::{verify_balance, verify_bids, verify_purse_balance, wait_for_balance};
use netctl_client::NodeConnector;
use netctl_types::app::{AccountSelector, AccountType, NetworkId, NodeId, PublicKey, URef};
use netctl_types::U512;
use std::path::Path;
use std::time::Duration;

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    #[clap(subcommand)]
    pub command: VerifyCommands,
}

#[derive(Subcommand, Debug)]
pub enum VerifyCommands {
    /// Main-purse balance of an account at the latest block.
    Balance {
        /// `net`, `node`, `type`, `index`.
        args: Vec<String>,
    },
    /// Balance of a purse (`uref-<hex>-<rights>`) at the latest block.
    Purse {
        purse: String,
        /// `net`, `node`, and optionally `min` (motes) with `wait` (seconds)
        /// to poll until the balance reaches `min`.
        args: Vec<String>,
    },
    /// Auction bids and delegations at the latest block.
    Bids {
        /// `net`, `node`, and optionally `validator`: a node id or a
        /// hex public key.
        args: Vec<String>,
    },
}

pub async fn run(config: &Path, args: VerifyArgs) -> Result<()> {
    let ws = Workspace::load(config)?;
    match args.command {
        VerifyCommands::Balance { args } => {
            let kv = KvArgs::parse(&args, &["net", "node", "type", "index"])?;
            let (network, node) = address(&ws, &kv)?;
            let selector = AccountSelector {
                account_type: kv.parse_or("type", AccountType::User)?,
                index: kv.parse_or("index", 1)?,
            };
            ws.topology.validate_selector(network, &selector)?;
            let account = ws.assets.public_key(network, &selector)?.account_hash();
            let client = ws.connector.connect(&ws.topology.endpoint(network, node)?)?;
            let result = verify_balance(client.as_ref(), &account)
                .await
                .with_context(|| format!("Balance of {} ({})", selector, account))?;
            print_json(&result)
        }
        VerifyCommands::Purse { purse, args } => {
            let purse: URef = purse
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid purse")?;
            let kv = KvArgs::parse(&args, &["net", "node", "min", "wait"])?;
            let (network, node) = address(&ws, &kv)?;
            let client = ws.connector.connect(&ws.topology.endpoint(network, node)?)?;
            let result = match kv.get("min") {
                Some(min) => {
                    let threshold = U512::from_dec_str(min)
                        .map_err(|e| anyhow::anyhow!("invalid min '{}': {:?}", min, e))?;
                    let wait = Duration::from_secs(kv.parse_or("wait", 60)?);
                    wait_for_balance(
                        client.as_ref(),
                        &purse,
                        threshold,
                        ws.config.execution.interval(),
                        wait,
                    )
                    .await?
                }
                None => verify_purse_balance(client.as_ref(), &purse)
                    .await
                    .with_context(|| format!("Balance of {}", purse))?,
            };
            print_json(&result)
        }
        VerifyCommands::Bids { args } => {
            let kv = KvArgs::parse(&args, &["net", "node", "validator"])?;
            let (network, node) = address(&ws, &kv)?;
            let validator = kv
                .get("validator")
                .map(|v| validator_key(&ws, network, v))
                .transpose()?;
            let client = ws.connector.connect(&ws.topology.endpoint(network, node)?)?;
            let auction = verify_bids(client.as_ref(), validator.as_ref())
                .await
                .context("Auction bids")?;
            print_json(&auction)
        }
    }
}

/// A node id names that node's operator key; anything else is a hex key.
fn validator_key(ws: &Workspace, network: NetworkId, raw: &str) -> Result<PublicKey> {
    match raw.parse::<u32>() {
        Ok(id) => {
            let selector = AccountSelector::node(NodeId(id));
            ws.topology.validate_selector(network, &selector)?;
            Ok(ws.assets.public_key(network, &selector)?)
        }
        Err(_) => raw
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .with_context(|| format!("Invalid validator '{}'", raw)),
    }
}

fn address(ws: &Workspace, kv: &KvArgs) -> Result<(NetworkId, NodeId)> {
    let network = NetworkId(kv.parse_or("net", ws.config.defaults.net.0)?);
    let node = NodeId(kv.parse_or("node", ws.config.defaults.node.0)?);
    Ok((network, node))
}
