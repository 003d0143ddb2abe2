// Path: crates/cli/src/commands/config.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use netctl_types::app::NetworkId;
use netctl_types::config::{NetctlConfig, NetworkEntry};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct ConfigCmdArgs {
    #[clap(subcommand)]
    pub command: ConfigSubCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubCommands {
    /// Write a netctl.toml holding every default.
    New {
        #[clap(long, default_value = ".")]
        out_dir: PathBuf,
        /// Record a network of this many nodes as network 1.
        #[clap(long)]
        nodes: Option<u32>,
        /// User accounts of the recorded network.
        #[clap(long, default_value = "0")]
        users: u32,
        /// Replace an existing file.
        #[clap(long)]
        force: bool,
    },
}

pub fn run(args: ConfigCmdArgs) -> Result<()> {
    match args.command {
        ConfigSubCommands::New {
            out_dir,
            nodes,
            users,
            force,
        } => {
            fs::create_dir_all(&out_dir)?;
            let path = out_dir.join("netctl.toml");
            if path.exists() && !force {
                bail!("{} already exists (use --force to replace it)", path.display());
            }

            let mut cfg = NetctlConfig::default();
            if let Some(nodes) = nodes {
                cfg.networks.push(NetworkEntry {
                    id: NetworkId(1),
                    nodes,
                    users,
                });
            }
            let text = cfg.to_toml_string()?;
            fs::write(&path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
