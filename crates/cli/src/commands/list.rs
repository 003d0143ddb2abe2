// Path: crates/cli/src/commands/list.rs

use super::Workspace;
use crate::util::{print_json, KvArgs};
use anyhow::Result;
use clap::Parser;
use netctl_types::app::{NetworkId, NodeEndpoint};
use serde::Serialize;
use std::path::Path;

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Optional filter, e.g. `net=2`.
    pub args: Vec<String>,
}

#[derive(Serialize)]
struct NetworkListing {
    network: NetworkId,
    chain_name: String,
    users: u32,
    nodes: Vec<NodeEndpoint>,
}

pub fn run(config: &Path, args: ListArgs) -> Result<()> {
    let ws = Workspace::load(config)?;
    let kv = KvArgs::parse(&args.args, &["net"])?;
    let only = kv.parse_opt::<u32>("net")?.map(NetworkId);

    let mut listings = Vec::new();
    for entry in ws.topology.networks() {
        if only.is_some_and(|net| net != entry.id) {
            continue;
        }
        let nodes = ws
            .topology
            .resolve_nodes(entry.id)?
            .into_iter()
            .map(|node| ws.topology.endpoint(entry.id, node))
            .collect::<Result<Vec<_>, _>>()?;
        listings.push(NetworkListing {
            network: entry.id,
            chain_name: ws.config.chain_name(entry.id),
            users: entry.users,
            nodes,
        });
    }
    if listings.is_empty() {
        log::warn!(
            "No networks found in configuration or under {}",
            ws.assets.root().display()
        );
    }
    print_json(&listings)
}
