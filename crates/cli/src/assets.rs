// Path: crates/cli/src/assets.rs

//! Access to the generated assets of a local network.
//!
//! Layout under the assets root:
//!
//! ```text
//! net-<n>/
//!   bin/<session>.wasm
//!   faucet/{public_key_hex,secret_key.pem}
//!   nodes/node-<k>/keys/{public_key_hex,secret_key.pem}
//!   users/user-<k>/{public_key_hex,secret_key.pem}
//! ```

use netctl_types::app::{AccountSelector, AccountType, NetworkId, PublicKey, Signer};
use netctl_types::config::NetctlConfig;
use netctl_types::error::ConfigError;
use std::path::{Path, PathBuf};

const PUBLIC_KEY_FILE: &str = "public_key_hex";
const SECRET_KEY_FILE: &str = "secret_key.pem";

/// The assets tree of all local networks.
#[derive(Debug, Clone)]
pub struct Assets {
    root: PathBuf,
}

impl Assets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &NetctlConfig) -> Self {
        Self::new(config.assets_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/net-<n>`.
    pub fn network_dir(&self, network: NetworkId) -> PathBuf {
        self.root.join(format!("net-{}", network.0))
    }

    /// The directory holding an account's key pair.
    pub fn account_dir(&self, network: NetworkId, selector: &AccountSelector) -> PathBuf {
        let net = self.network_dir(network);
        match selector.account_type {
            AccountType::Faucet => net.join("faucet"),
            AccountType::Node => net
                .join("nodes")
                .join(format!("node-{}", selector.index))
                .join("keys"),
            AccountType::User => net.join("users").join(format!("user-{}", selector.index)),
        }
    }

    /// Reads an account's public key.
    pub fn public_key(
        &self,
        network: NetworkId,
        selector: &AccountSelector,
    ) -> Result<PublicKey, ConfigError> {
        let path = self.account_dir(network, selector).join(PUBLIC_KEY_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| missing(&path, e.to_string()))?;
        PublicKey::from_hex(&text).map_err(|e| missing(&path, e))
    }

    /// The signing identity of an account: its public key and secret key path.
    pub fn signer(&self, network: NetworkId, selector: &AccountSelector) -> Result<Signer, ConfigError> {
        let public_key = self.public_key(network, selector)?;
        let secret_key = self.account_dir(network, selector).join(SECRET_KEY_FILE);
        if !secret_key.is_file() {
            return Err(missing(&secret_key, "no such file".into()));
        }
        Ok(Signer {
            public_key,
            secret_key,
        })
    }

    /// A session module shipped in `net-<n>/bin`.
    pub fn wasm(&self, network: NetworkId, name: &str) -> Result<PathBuf, ConfigError> {
        let path = self.network_dir(network).join("bin").join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(missing(&path, "no such file".into()))
        }
    }
}

fn missing(path: &Path, reason: String) -> ConfigError {
    ConfigError::MissingAsset {
        path: path.display().to_string(),
        reason,
    }
}
