// Path: crates/cli/src/commands/view.rs

use super::{print_batch, Workspace};
use crate::util::{print_json, KvArgs};
use anyhow::Result;
use clap::Parser;
use netctl_cli::AccountRenderer;
use netctl_types::app::{AccountSelector, AccountType, NetworkId, NodeId, NodeTarget};
use std::path::Path;

#[derive(Parser, Debug)]
pub struct ViewArgs {
    /// `key=value` pairs: `net`, `node` (number or `all`), `type`
    /// (`faucet`, `node`, `user`), `index`.
    pub args: Vec<String>,
}

pub async fn run(config: &Path, args: ViewArgs) -> Result<()> {
    let ws = Workspace::load(config)?;
    let kv = KvArgs::parse(&args.args, &["net", "node", "type", "index"])?;
    let network = NetworkId(kv.parse_or("net", ws.config.defaults.net.0)?);
    let target = kv.parse_or("node", NodeTarget::One(ws.config.defaults.node))?;
    let account_type = kv.parse_or("type", AccountType::Node)?;
    let index = kv.parse_opt::<u32>("index")?;

    let renderer = AccountRenderer::new(&ws.topology, &ws.assets, &ws.connector);
    match target {
        NodeTarget::All => {
            let report = renderer.render_all(network, account_type, index).await?;
            print_batch(report)
        }
        NodeTarget::One(node) => {
            let selector = selector(account_type, index, node);
            let view = renderer.render_account(network, node, selector).await?;
            print_json(&view)
        }
    }
}

/// Without an index, `type=node` means the addressed node's own account and
/// every other type means index 1.
fn selector(account_type: AccountType, index: Option<u32>, node: NodeId) -> AccountSelector {
    match (account_type, index) {
        (AccountType::Node, None) => AccountSelector::node(node),
        (account_type, index) => AccountSelector {
            account_type,
            index: index.unwrap_or(1),
        },
    }
}
