// Path: crates/client/src/rpc.rs

//! A JSON-RPC 2.0 client for a node's query endpoint.

use crate::ChainQuery;
use async_trait::async_trait;
use netctl_types::app::{
    AccountHash, AccountRecord, AuctionState, BlockHash, BlockSummary, DelegatorStake,
    DeployHash, ExecutionOutcome, NodeStatus, PublicKey, StateRootHash, URef, ValidatorBid,
};
use netctl_types::error::RemoteError;
use netctl_types::U512;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// JSON-RPC error codes a node uses for "the item you asked for does not
/// exist": no such deploy, no such block, query failed, balance lookup failed.
const LOOKUP_MISS_CODES: [i64; 4] = [-32000, -32001, -32003, -32006];

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct StatusResult {
    last_added_block_info: Option<MinimalBlockInfo>,
}

#[derive(Deserialize)]
struct MinimalBlockInfo {
    hash: BlockHash,
    height: u64,
}

#[derive(Deserialize)]
struct BlockResult {
    block: Option<JsonBlock>,
}

#[derive(Deserialize)]
struct JsonBlock {
    hash: BlockHash,
    header: JsonBlockHeader,
}

#[derive(Deserialize)]
struct JsonBlockHeader {
    height: u64,
    state_root_hash: StateRootHash,
}

#[derive(Deserialize)]
struct StateItemResult {
    stored_value: Value,
}

#[derive(Deserialize)]
struct JsonAccount {
    account_hash: AccountHash,
    main_purse: URef,
    #[serde(default)]
    named_keys: Vec<JsonNamedKey>,
}

#[derive(Deserialize)]
struct JsonNamedKey {
    name: String,
    key: String,
}

#[derive(Deserialize)]
struct BalanceResult {
    balance_value: String,
}

#[derive(Deserialize)]
struct DeployResult {
    #[serde(default)]
    execution_results: Vec<JsonExecutionResult>,
}

#[derive(Deserialize)]
struct JsonExecutionResult {
    block_hash: BlockHash,
    result: Value,
}

#[derive(Deserialize)]
struct AuctionInfoResult {
    auction_state: JsonAuctionState,
}

#[derive(Deserialize)]
struct JsonAuctionState {
    state_root_hash: StateRootHash,
    block_height: u64,
    #[serde(default)]
    bids: Vec<JsonBidEntry>,
}

#[derive(Deserialize)]
struct JsonBidEntry {
    public_key: PublicKey,
    bid: JsonBid,
}

#[derive(Deserialize)]
struct JsonBid {
    staked_amount: String,
    delegation_rate: u8,
    #[serde(default)]
    inactive: bool,
    #[serde(default)]
    delegators: Vec<JsonDelegator>,
}

#[derive(Deserialize)]
struct JsonDelegator {
    public_key: PublicKey,
    staked_amount: String,
}

/// A JSON-RPC client bound to one node's `/rpc` endpoint.
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Creates a client whose every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs one JSON-RPC call and returns its `result`.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, RemoteError>
    where
        P: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        log::debug!("rpc -> {} {}", self.url, method);

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Transport(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let body: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(format!("{}: {}", method, e)))?;

        match (body.result, body.error) {
            (_, Some(err)) => Err(RemoteError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RemoteError::Malformed(format!(
                "{}: response has neither result nor error",
                method
            ))),
        }
    }

    /// Like [`JsonRpcClient::call`], mapping lookup-miss errors to `Ok(None)`.
    async fn lookup<P, R>(&self, method: &str, params: P) -> Result<Option<R>, RemoteError>
    where
        P: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        match self.call(method, params).await {
            Ok(r) => Ok(Some(r)),
            Err(RemoteError::Rpc { code, message }) if LOOKUP_MISS_CODES.contains(&code) => {
                log::debug!("rpc {} lookup miss ({}): {}", method, code, message);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn transport_error(method: &str, e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout(format!("{}: {}", method, e))
    } else {
        RemoteError::Transport(format!("{}: {}", method, e))
    }
}

fn block_summary(block: JsonBlock) -> BlockSummary {
    BlockSummary {
        hash: block.hash,
        height: block.header.height,
        state_root_hash: block.header.state_root_hash,
    }
}

fn parse_motes(raw: &str, what: &str) -> Result<U512, RemoteError> {
    U512::from_dec_str(raw)
        .map_err(|e| RemoteError::Malformed(format!("{} '{}': {:?}", what, raw, e)))
}

/// Converts a `state_get_auction_info` result.
pub fn auction_from_result(value: Value) -> Result<AuctionState, RemoteError> {
    let result: AuctionInfoResult = serde_json::from_value(value)
        .map_err(|e| RemoteError::Malformed(format!("auction info: {}", e)))?;
    let state = result.auction_state;
    let bids = state
        .bids
        .into_iter()
        .map(|entry| {
            let delegators = entry
                .bid
                .delegators
                .into_iter()
                .map(|d| {
                    Ok(DelegatorStake {
                        public_key: d.public_key,
                        staked_amount: parse_motes(&d.staked_amount, "delegated amount")?,
                    })
                })
                .collect::<Result<Vec<_>, RemoteError>>()?;
            Ok(ValidatorBid {
                public_key: entry.public_key,
                staked_amount: parse_motes(&entry.bid.staked_amount, "staked amount")?,
                delegation_rate: entry.bid.delegation_rate,
                inactive: entry.bid.inactive,
                delegators,
            })
        })
        .collect::<Result<Vec<_>, RemoteError>>()?;
    Ok(AuctionState {
        state_root_hash: state.state_root_hash,
        block_height: state.block_height,
        bids,
    })
}

/// Extracts an account from a `stored_value`. Returns `Ok(None)` when the
/// value stored under the key is not an account.
pub fn account_from_stored_value(value: &Value) -> Result<Option<AccountRecord>, RemoteError> {
    let Some(raw) = value.get("Account") else {
        return Ok(None);
    };
    let account: JsonAccount = serde_json::from_value(raw.clone())
        .map_err(|e| RemoteError::Malformed(format!("stored account: {}", e)))?;
    Ok(Some(AccountRecord {
        account_hash: account.account_hash,
        main_purse: account.main_purse,
        named_keys: account
            .named_keys
            .into_iter()
            .map(|nk| (nk.name, nk.key))
            .collect(),
    }))
}

/// Reads the first execution result of an `info_get_deploy` result.
pub fn outcome_from_deploy_result(value: Value) -> Result<Option<ExecutionOutcome>, RemoteError> {
    let result: DeployResult = serde_json::from_value(value)
        .map_err(|e| RemoteError::Malformed(format!("deploy result: {}", e)))?;
    let Some(first) = result.execution_results.into_iter().next() else {
        return Ok(None);
    };
    let error_message = if let Some(failure) = first.result.get("Failure") {
        Some(
            failure
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("execution failed")
                .to_string(),
        )
    } else if first.result.get("Success").is_some() {
        None
    } else {
        return Err(RemoteError::Malformed(
            "execution result is neither Success nor Failure".into(),
        ));
    };
    Ok(Some(ExecutionOutcome {
        block_hash: first.block_hash,
        error_message,
    }))
}

#[async_trait]
impl ChainQuery for JsonRpcClient {
    async fn get_status(&self) -> Result<NodeStatus, RemoteError> {
        let status: StatusResult = self.call("info_get_status", json!({})).await?;
        Ok(match status.last_added_block_info {
            Some(info) => NodeStatus {
                last_added_block_height: Some(info.height),
                last_added_block_hash: Some(info.hash),
            },
            None => NodeStatus::default(),
        })
    }

    async fn get_block_by_height(&self, height: u64) -> Result<Option<BlockSummary>, RemoteError> {
        let params = json!({ "block_identifier": { "Height": height } });
        let result: Option<BlockResult> = self.lookup("chain_get_block", params).await?;
        Ok(result.and_then(|r| r.block).map(block_summary))
    }

    async fn get_block_by_hash(
        &self,
        hash: &BlockHash,
    ) -> Result<Option<BlockSummary>, RemoteError> {
        let params = json!({ "block_identifier": { "Hash": hash.to_hex() } });
        let result: Option<BlockResult> = self.lookup("chain_get_block", params).await?;
        Ok(result.and_then(|r| r.block).map(block_summary))
    }

    async fn get_account(
        &self,
        root: &StateRootHash,
        account: &AccountHash,
    ) -> Result<Option<AccountRecord>, RemoteError> {
        let params = json!({
            "state_root_hash": root.to_hex(),
            "key": account.to_key_string(),
            "path": [],
        });
        let result: Option<StateItemResult> = self.lookup("state_get_item", params).await?;
        match result {
            Some(item) => account_from_stored_value(&item.stored_value),
            None => Ok(None),
        }
    }

    async fn get_balance(
        &self,
        root: &StateRootHash,
        purse: &URef,
    ) -> Result<Option<U512>, RemoteError> {
        let params = json!({
            "state_root_hash": root.to_hex(),
            "purse_uref": purse.to_formatted_string(),
        });
        let result: Option<BalanceResult> = self.lookup("state_get_balance", params).await?;
        result
            .map(|r| parse_motes(&r.balance_value, "balance"))
            .transpose()
    }

    async fn get_execution_outcome(
        &self,
        deploy: &DeployHash,
    ) -> Result<Option<ExecutionOutcome>, RemoteError> {
        let params = json!({ "deploy_hash": deploy.to_string() });
        match self.lookup::<_, Value>("info_get_deploy", params).await? {
            Some(value) => outcome_from_deploy_result(value),
            None => Ok(None),
        }
    }

    async fn get_auction_state(
        &self,
        block: &BlockHash,
    ) -> Result<Option<AuctionState>, RemoteError> {
        let params = json!({ "block_identifier": { "Hash": block.to_hex() } });
        match self.lookup::<_, Value>("state_get_auction_info", params).await? {
            Some(value) => auction_from_result(value).map(Some),
            None => Ok(None),
        }
    }
}
