// Path: crates/client/src/submit.rs

//! Deploy submission through the `casper-client` binary, which owns signing.

use crate::DeploySubmitter;
use async_trait::async_trait;
use netctl_types::app::{DeployHash, DeployRequest, Session};
use netctl_types::error::RemoteError;
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;

#[derive(Deserialize)]
struct PutDeployOutput {
    result: PutDeployResult,
}

#[derive(Deserialize)]
struct PutDeployResult {
    deploy_hash: DeployHash,
}

/// Submits deploys by running `<bin> put-deploy ...` against one node.
#[derive(Debug, Clone)]
pub struct CasperClientSubmitter {
    bin: String,
    node_address: String,
    timeout: Duration,
}

impl CasperClientSubmitter {
    pub fn new(bin: impl Into<String>, node_address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            node_address: node_address.into(),
            timeout,
        }
    }

    /// The full argument vector of the `put-deploy` invocation for `deploy`.
    pub fn put_deploy_args(&self, deploy: &DeployRequest) -> Vec<String> {
        let mut args = vec![
            "put-deploy".to_string(),
            "--node-address".to_string(),
            self.node_address.clone(),
            "--chain-name".to_string(),
            deploy.chain_name.clone(),
            "--secret-key".to_string(),
            deploy.signer.secret_key.display().to_string(),
            "--payment-amount".to_string(),
            deploy.payment.to_string(),
            "--gas-price".to_string(),
            deploy.gas_price.to_string(),
        ];
        match &deploy.session {
            Session::StoredContract {
                contract_hash,
                entry_point,
                ..
            } => {
                args.push("--session-hash".to_string());
                args.push(contract_hash.clone());
                args.push("--session-entry-point".to_string());
                args.push(entry_point.clone());
            }
            Session::Wasm { path, .. } => {
                args.push("--session-path".to_string());
                args.push(path.display().to_string());
            }
        }
        for arg in deploy.session.args().to_cli_args() {
            args.push("--session-arg".to_string());
            args.push(arg);
        }
        args
    }
}

/// Reads `result.deploy_hash` from the submitter's JSON output.
pub fn parse_put_deploy_output(stdout: &str) -> Result<DeployHash, RemoteError> {
    let output: PutDeployOutput = serde_json::from_str(stdout.trim()).map_err(|e| {
        RemoteError::Submission(format!("unexpected put-deploy output ({}): {}", e, stdout.trim()))
    })?;
    Ok(output.result.deploy_hash)
}

#[async_trait]
impl DeploySubmitter for CasperClientSubmitter {
    async fn submit(&self, deploy: &DeployRequest) -> Result<DeployHash, RemoteError> {
        let args = self.put_deploy_args(deploy);
        log::debug!("{} {}", self.bin, args.join(" "));

        let run = Command::new(&self.bin).args(&args).kill_on_drop(true).output();
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                RemoteError::Timeout(format!(
                    "put-deploy ({}) did not finish within {:?}",
                    deploy.session.label(),
                    self.timeout
                ))
            })?
            .map_err(|e| RemoteError::Transport(format!("failed to run {}: {}", self.bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RemoteError::Submission(stderr.trim().to_string()));
        }
        let hash = parse_put_deploy_output(&String::from_utf8_lossy(&output.stdout))?;
        log::info!("Submitted {} deploy {}", deploy.session.label(), hash);
        Ok(hash)
    }
}
