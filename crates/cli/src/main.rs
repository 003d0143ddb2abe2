// Path: crates/cli/src/main.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # netctl
//!
//! Inspect and stake against a local multi-node test network.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod util;

use commands::*;

#[derive(Parser, Debug)]
#[clap(
    name = "netctl",
    version,
    about = "Control plane for local multi-node test networks.",
    long_about = "netctl lists network topologies, renders account state from each node, runs staking operations (approve, delegate, add-bid) and verifies balances on chain."
)]
struct Cli {
    /// Path to the configuration file. Built-in defaults apply when it is absent.
    #[clap(long, global = true, default_value = "netctl.toml")]
    config: PathBuf,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List networks and their node endpoints.
    List(list::ListArgs),

    /// Render an account's on-chain state from one node or all of them.
    View(view::ViewArgs),

    /// Run a staking operation.
    Stake(stake::StakeArgs),

    /// Read balances and auction bids back from the chain.
    Verify(verify::VerifyArgs),

    /// Generate configuration files.
    Config(config::ConfigCmdArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match cli.command {
        Commands::List(args) => list::run(&cli.config, args),
        Commands::View(args) => view::run(&cli.config, args).await,
        Commands::Stake(args) => stake::run(&cli.config, args).await,
        Commands::Verify(args) => verify::run(&cli.config, args).await,
        Commands::Config(args) => config::run(args),
    }
}
