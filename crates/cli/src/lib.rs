// Path: crates/cli/src/lib.rs
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

//! # netctl CLI Library
//!
//! The control plane behind the `netctl` binary: it resolves which nodes of a
//! local test network to address, renders account state as seen by those
//! nodes, and drives the staking pipeline (fresh purse, funding, contract
//! call) against them.
//!
//! ## Architectural Boundary
//!
//! This crate only composes the public APIs of `netctl-types` and
//! `netctl-client`. Every remote interaction goes through the
//! [`netctl_client::NodeConnector`] seam, which is what lets the `testing`
//! module substitute an in-memory chain.
//!
//! This crate contains modules for:
//! - `topology` and `assets`: where nodes listen and where their keys live.
//! - `render`: account views, single node or fanned out over all nodes.
//! - `args`, `purse`, `dispatch`: the staking pipeline.
//! - `verify`: the status → block → account → balance read chain, and the
//!   auction bids read.
//! - `testing`: helpers for writing unit and integration tests.

pub mod args;
pub mod assets;
pub mod dispatch;
pub mod poll;
pub mod purse;
pub mod render;
pub mod testing;
pub mod topology;
pub mod verify;

pub use args::{build_args, prepare, ArgField, ArgFields, OperationKind, PreparedArgs};
pub use assets::Assets;
pub use dispatch::{DispatchReport, DispatchStep, Dispatcher, StakingOperationRequest};
pub use purse::{DeployPurseHost, FundingManager, PurseHost};
pub use render::{AccountRenderer, AccountView, BatchReport};
pub use topology::Topology;
pub use verify::{
    verify_balance, verify_bids, verify_purse_balance, wait_for_balance, ChainQueryResult,
};
