// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # netctl Types
//!
//! This crate is the foundational library for netctl, containing the
//! identifiers, chain-side handles, named-argument model, configuration and
//! error types shared by the client and CLI crates.
//!
//! ## Architectural Role
//!
//! As the base crate, `netctl-types` performs no I/O beyond reading its own
//! configuration file. Everything remote (queries, deploy submission) lives in
//! `netctl-client`; everything that orchestrates lives in `netctl-cli`.

/// The motes amount used for staking operations when the caller gives none.
pub const DEFAULT_STAKE_AMOUNT: u64 = 1_000_000_000;

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::NetctlError> = std::result::Result<T, E>;

/// Identifiers, keys, purses and the chain records read back from a node.
pub mod app;
/// Typed named arguments passed to contract entry points.
pub mod args;
/// The canonical, deterministic binary codec for named-argument sets.
pub mod codec;
/// Process-wide configuration (`netctl.toml`).
pub mod config;
/// A unified set of all error types used across netctl.
pub mod error;
/// A prelude containing useful extension traits like `OptionExt`.
pub mod prelude;

pub use primitive_types::U512;
