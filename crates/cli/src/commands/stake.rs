// Path: crates/cli/src/commands/stake.rs

use super::{print_batch, Workspace};
use crate::util::{print_json, KvArgs};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netctl_cli::{Dispatcher, OperationKind, StakingOperationRequest};
use netctl_types::app::{NetworkId, NodeTarget};
use std::path::Path;

#[derive(Parser, Debug)]
pub struct StakeArgs {
    #[clap(subcommand)]
    pub command: StakeCommands,
}

#[derive(Subcommand, Debug)]
pub enum StakeCommands {
    /// Approve a user as spender on the token contract (signed by the faucet).
    Approve {
        /// `net`, `node`, `user`, `amount`, `gas`, `payment`.
        args: Vec<String>,
    },
    /// Delegate a user's stake to a validator (signed by the user).
    Delegate {
        /// `net`, `node`, `user`, `validator`, `amount`, `gas`, `payment`.
        args: Vec<String>,
    },
    /// Submit a validator bid (signed by the node operator).
    AddBid {
        /// `net`, `node` (number or `all`), `rate`, `amount`, `gas`, `payment`.
        args: Vec<String>,
    },
}

const KEYS: &[&str] = &[
    "net", "node", "user", "amount", "gas", "payment", "validator", "rate",
];

pub async fn run(config: &Path, args: StakeArgs) -> Result<()> {
    let (kind, raw) = match args.command {
        StakeCommands::Approve { args } => (OperationKind::Approve, args),
        StakeCommands::Delegate { args } => (OperationKind::Delegate, args),
        StakeCommands::AddBid { args } => (OperationKind::AddBid, args),
    };
    let ws = Workspace::load(config)?;
    let kv = KvArgs::parse(&raw, KEYS)?;
    let request = StakingOperationRequest {
        amount: kv.get_owned("amount"),
        gas_payment: kv.get_owned("payment"),
        gas_price: kv.get_owned("gas"),
        user: kv.parse_opt("user")?,
        network: kv.parse_opt::<u32>("net")?.map(NetworkId),
        validator: kv.get_owned("validator"),
        delegation_rate: kv.get_owned("rate"),
        ..StakingOperationRequest::new(kind)
    };
    let target = kv.parse_or("node", NodeTarget::One(ws.config.defaults.node))?;

    let dispatcher = Dispatcher::new(&ws.config, &ws.topology, &ws.assets, &ws.connector);
    match target {
        NodeTarget::All => {
            let report = dispatcher.dispatch_all(&request, NodeTarget::All).await?;
            print_batch(report)
        }
        NodeTarget::One(node) => {
            let request = StakingOperationRequest {
                node: Some(node),
                ..request
            };
            let report = dispatcher
                .dispatch(&request)
                .await
                .with_context(|| format!("{} on {} failed", kind, node))?;
            print_json(&report)
        }
    }
}
