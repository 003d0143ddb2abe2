// Path: crates/cli/src/testing/mod.rs
//! Helpers for exercising the pipeline without a running network: an
//! in-memory chain and a generated assets tree. Exposed as part of the
//! library so downstream tests can use the same tooling.

pub mod chain;
pub mod network;

pub use chain::{MockCall, MockChain, MockConnector};
pub use network::{fixture_public_key, TestNetwork, TestNetworkBuilder};
