// Path: crates/cli/src/dispatch.rs

//! The staking pipeline: validate, fund a fresh purse, finalize the
//! arguments and submit one deploy against a system contract.
//!
//! A dispatch walks the steps of [`DispatchStep`] strictly in order and only
//! advances on success. A failing step ends the dispatch with that step's
//! error; nothing is retried and nothing is rolled back, so a purse created
//! before a failed transfer is left behind unfunded.

use crate::args::{prepare, ArgField, ArgFields, OperationKind, PreparedArgs};
use crate::assets::Assets;
use crate::purse::{DeployPurseHost, FundingManager, PurseSessions};
use crate::render::{serialize_motes, BatchReport};
use crate::topology::Topology;
use crate::verify::{account_at, latest_state, StateSnapshot};
use netctl_client::{ChainQuery, NodeClient, NodeConnector};
use netctl_types::app::{
    AccountHash, AccountSelector, DeployHash, DeployRequest, NetworkId, NodeEndpoint, NodeId,
    NodeTarget, PublicKey, Session, Signer, URef,
};
use netctl_types::config::NetctlConfig;
use netctl_types::error::{NetctlError, RemoteError, ValidationError};
use netctl_types::prelude::OptionExt;
use netctl_types::U512;
use serde::Serialize;
use std::fmt::Display;

/// A staking request as received from the caller. Unset fields fall back to
/// the configured defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingOperationRequest {
    pub kind: OperationKind,
    pub amount: Option<String>,
    pub gas_payment: Option<String>,
    pub gas_price: Option<String>,
    pub user: Option<u32>,
    pub network: Option<NetworkId>,
    pub node: Option<NodeId>,
    /// Delegate only: the validator's public key. Defaults to the operator
    /// key of the addressed node.
    pub validator: Option<String>,
    /// Add-bid only.
    pub delegation_rate: Option<String>,
}

impl StakingOperationRequest {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            amount: None,
            gas_payment: None,
            gas_price: None,
            user: None,
            network: None,
            node: None,
            validator: None,
            delegation_rate: None,
        }
    }
}

/// The pipeline's states, in the only order they can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStep {
    Validated,
    PurseResolved,
    PurseCreated,
    PurseFunded,
    ArgsFinalized,
    Submitted,
}

/// What a successful dispatch did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub kind: OperationKind,
    pub network: NetworkId,
    pub node: NodeId,
    pub signer: PublicKey,
    pub contract_hash: String,
    pub entry_point: String,
    #[serde(serialize_with = "serialize_motes")]
    pub amount: U512,
    /// The funded purse, for operations that spend from one.
    pub purse: Option<URef>,
    pub steps: Vec<DispatchStep>,
    pub deploy_hash: DeployHash,
}

/// Everything resolved locally before the first remote call.
struct Plan {
    network: NetworkId,
    node: NodeId,
    endpoint: NodeEndpoint,
    chain_name: String,
    signer: Signer,
    faucet: AccountHash,
    contract_key: String,
    prepared: PreparedArgs,
    amount: U512,
    payment: U512,
    gas_price: u64,
    sessions: Option<PurseSessions>,
}

struct Progress {
    label: String,
    steps: Vec<DispatchStep>,
}

impl Progress {
    fn reached(&mut self, step: DispatchStep, detail: impl Display) {
        log::info!("[{}] {:?}: {}", self.label, step, detail);
        self.steps.push(step);
    }

    fn last(&self) -> Option<DispatchStep> {
        self.steps.last().copied()
    }
}

pub struct Dispatcher<'a> {
    config: &'a NetctlConfig,
    topology: &'a Topology,
    assets: &'a Assets,
    connector: &'a dyn NodeConnector,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        config: &'a NetctlConfig,
        topology: &'a Topology,
        assets: &'a Assets,
        connector: &'a dyn NodeConnector,
    ) -> Self {
        Self {
            config,
            topology,
            assets,
            connector,
        }
    }

    /// Runs the pipeline for one request against one node.
    pub async fn dispatch(
        &self,
        request: &StakingOperationRequest,
    ) -> Result<DispatchReport, NetctlError> {
        let plan = self.plan(request)?;
        let mut progress = Progress {
            label: format!("{} {}/{}", request.kind, plan.network, plan.node),
            steps: Vec::new(),
        };
        progress.reached(DispatchStep::Validated, "arguments complete");

        let client = self.connector.connect(&plan.endpoint)?;
        self.run(client.as_ref(), plan, &mut progress)
            .await
            .inspect_err(|e| {
                log::warn!(
                    "[{}] aborted after {:?}: {}",
                    progress.label,
                    progress.last(),
                    e
                )
            })
    }

    /// Runs the pipeline once per targeted node, one node after another.
    pub async fn dispatch_all(
        &self,
        request: &StakingOperationRequest,
        target: NodeTarget,
    ) -> Result<BatchReport<DispatchReport>, NetctlError> {
        let network = request.network.unwrap_or(self.config.defaults.net);
        let mut report = BatchReport::default();
        for node in self.topology.resolve(network, target)? {
            let per_node = StakingOperationRequest {
                network: Some(network),
                node: Some(node),
                ..request.clone()
            };
            let outcome = self.dispatch(&per_node).await;
            report.results.insert(node, outcome);
        }
        Ok(report)
    }

    fn plan(&self, request: &StakingOperationRequest) -> Result<Plan, NetctlError> {
        let defaults = &self.config.defaults;
        let network = request.network.unwrap_or(defaults.net);
        let node = request.node.unwrap_or(defaults.node);
        let endpoint = self.topology.endpoint(network, node)?;

        let mut fields = ArgFields::new()
            .with(
                ArgField::Amount,
                request.amount.clone().unwrap_or_else(|| defaults.amount.to_string()),
            )
            .with(
                ArgField::GasPayment,
                request
                    .gas_payment
                    .clone()
                    .unwrap_or_else(|| defaults.gas_payment.to_string()),
            )
            .with(
                ArgField::GasPrice,
                request
                    .gas_price
                    .clone()
                    .unwrap_or_else(|| defaults.gas_price.to_string()),
            );

        let user = AccountSelector::user(request.user.unwrap_or(defaults.user));
        let contracts = &self.config.contracts;
        let (signer, contract_key) = match request.kind {
            OperationKind::AddBid => {
                let signer = self.assets.signer(network, &AccountSelector::node(node))?;
                fields.set(ArgField::PublicKey, signer.public_key.to_hex());
                if let Some(rate) = &request.delegation_rate {
                    fields.set(ArgField::DelegationRate, rate.clone());
                }
                (signer, &contracts.auction_named_key)
            }
            OperationKind::Delegate => {
                self.topology.validate_selector(network, &user)?;
                let signer = self.assets.signer(network, &user)?;
                let validator = match &request.validator {
                    Some(key) => key.clone(),
                    None => self
                        .assets
                        .public_key(network, &AccountSelector::node(node))?
                        .to_hex(),
                };
                fields.set(ArgField::Delegator, signer.public_key.to_hex());
                fields.set(ArgField::Validator, validator);
                (signer, &contracts.auction_named_key)
            }
            OperationKind::Approve => {
                self.topology.validate_selector(network, &user)?;
                let spender = self.assets.public_key(network, &user)?;
                fields.set(ArgField::User, spender.to_hex());
                let signer = self.assets.signer(network, &AccountSelector::faucet())?;
                (signer, &contracts.token_named_key)
            }
        };

        let prepared = prepare(request.kind, &fields)?;
        let amount = prepared
            .amount()
            .required_with(|| ValidationError::MissingArgument(ArgField::Amount.key().into()))?;
        let payment = prepared
            .gas_payment()
            .required_with(|| ValidationError::MissingArgument(ArgField::GasPayment.key().into()))?;
        let gas_price = prepared
            .gas_price()
            .required_with(|| ValidationError::MissingArgument(ArgField::GasPrice.key().into()))?;

        let chain_name = self.config.chain_name(network);
        let sessions = if request.kind.needs_purse() {
            Some(PurseSessions {
                chain_name: chain_name.clone(),
                create_purse_wasm: self.assets.wasm(network, &contracts.create_purse_wasm)?,
                transfer_wasm: self.assets.wasm(network, &contracts.transfer_wasm)?,
                payment,
                gas_price,
                wait: self.config.execution.clone(),
            })
        } else {
            None
        };
        let faucet = self
            .assets
            .public_key(network, &AccountSelector::faucet())?
            .account_hash();

        Ok(Plan {
            network,
            node,
            endpoint,
            chain_name,
            signer,
            faucet,
            contract_key: contract_key.clone(),
            prepared,
            amount,
            payment,
            gas_price,
            sessions,
        })
    }

    async fn run(
        &self,
        client: &dyn NodeClient,
        plan: Plan,
        progress: &mut Progress,
    ) -> Result<DispatchReport, NetctlError> {
        let state = latest_state(client).await?;
        let contract_hash = resolve_contract(client, &state, &plan.faucet, &plan.contract_key).await?;

        let purse = match &plan.sessions {
            Some(sessions) => {
                let owner = account_at(client, &state, &plan.signer.account_hash()).await?;
                let main_purse = owner.main_purse;
                progress.reached(DispatchStep::PurseResolved, main_purse);

                let funding = FundingManager::new(DeployPurseHost::new(
                    client,
                    plan.signer.clone(),
                    sessions.clone(),
                ));
                let purse = funding.create_purse().await?;
                progress.reached(DispatchStep::PurseCreated, purse);

                if let Err(e) = funding.fund_purse(&main_purse, &purse, plan.amount).await {
                    log::warn!("Purse {} left unfunded", purse);
                    return Err(e);
                }
                progress.reached(
                    DispatchStep::PurseFunded,
                    format!("{} motes in {}", plan.amount, purse),
                );
                Some(purse)
            }
            None => None,
        };

        let args = plan.prepared.finalize(purse)?;
        let names = args.names().join(", ");
        let entry_point = plan.prepared.kind().entry_point().to_string();
        let deploy = DeployRequest {
            chain_name: plan.chain_name.clone(),
            signer: plan.signer.clone(),
            session: Session::StoredContract {
                contract_hash: contract_hash.clone(),
                entry_point: entry_point.clone(),
                args,
            },
            payment: plan.payment,
            gas_price: plan.gas_price,
        };
        progress.reached(
            DispatchStep::ArgsFinalized,
            format!("{} ({} bytes)", names, deploy.encoded_args().len()),
        );

        let deploy_hash = client.submit(&deploy).await?;
        progress.reached(DispatchStep::Submitted, deploy_hash);

        Ok(DispatchReport {
            kind: plan.prepared.kind(),
            network: plan.network,
            node: plan.node,
            signer: plan.signer.public_key,
            contract_hash,
            entry_point,
            amount: plan.amount,
            purse,
            steps: progress.steps.clone(),
            deploy_hash,
        })
    }
}

/// Looks up a system contract by named key on `owner`'s account.
pub async fn resolve_contract<C>(
    client: &C,
    state: &StateSnapshot,
    owner: &AccountHash,
    name: &str,
) -> Result<String, NetctlError>
where
    C: ChainQuery + ?Sized,
{
    let account = account_at(client, state, owner).await?;
    let hash = account.named_keys.get(name).cloned().required_with(|| {
        RemoteError::ContractNotFound(format!("no named key '{}' on {}", name, owner))
    })?;
    Ok(hash)
}
