// Path: crates/cli/src/commands/mod.rs

pub mod config;
pub mod list;
pub mod stake;
pub mod verify;
pub mod view;

use anyhow::{Context, Result};
use netctl_cli::{Assets, BatchReport, Topology};
use netctl_client::{connector_from_config, HttpConnector};
use netctl_types::config::NetctlConfig;
use netctl_types::error::ErrorCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Everything a command needs to address a network.
pub struct Workspace {
    pub config: NetctlConfig,
    pub topology: Topology,
    pub assets: Assets,
    pub connector: HttpConnector,
}

impl Workspace {
    pub fn load(path: &Path) -> Result<Self> {
        let config = NetctlConfig::load_or_default(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        let topology = Topology::discover(&config).context("Failed to resolve network topology")?;
        let assets = Assets::from_config(&config);
        let connector = connector_from_config(&config);
        Ok(Self {
            config,
            topology,
            assets,
            connector,
        })
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum NodeOutcome<'a, T> {
    Ok(&'a T),
    Err { code: &'static str, error: String },
}

/// Prints every node's result, then fails if any node did.
pub fn print_batch<T: Serialize>(report: BatchReport<T>) -> Result<()> {
    let rendered: BTreeMap<String, NodeOutcome<'_, T>> = report
        .results
        .iter()
        .map(|(node, result)| {
            let outcome = match result {
                Ok(value) => NodeOutcome::Ok(value),
                Err(e) => NodeOutcome::Err {
                    code: e.code(),
                    error: e.to_string(),
                },
            };
            (node.to_string(), outcome)
        })
        .collect();
    crate::util::print_json(&rendered)?;
    report.into_outcome()?;
    Ok(())
}
