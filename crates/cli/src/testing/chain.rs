// Path: crates/cli/src/testing/chain.rs

//! An in-memory chain implementing the client traits.
//!
//! Deploys execute synchronously on submission and seal one block each, so a
//! deploy's outcome is visible on the first poll. Every sealed block keeps a
//! snapshot of global state under its state root; reads at an older root see
//! that block's state.

use async_trait::async_trait;
use netctl_client::{ChainQuery, DeploySubmitter, NodeClient, NodeConnector};
use netctl_types::app::{
    AccessRights, AccountHash, AccountRecord, AuctionState, BlockHash, BlockSummary,
    DelegatorStake, DeployHash, DeployRequest, Digest, ExecutionOutcome, NodeEndpoint, NodeId,
    NodeStatus, PublicKey, Session, StateRootHash, URef, ValidatorBid,
};
use netctl_types::args::{CLValue, NamedArgSet};
use netctl_types::codec::from_bytes_canonical;
use netctl_types::error::RemoteError;
use netctl_types::U512;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A recorded interaction with a [`MockChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Status,
    Block(u64),
    BlockByHash(BlockHash),
    Account(AccountHash),
    Balance(URef),
    ExecutionOutcome(DeployHash),
    Auction(BlockHash),
    Submit {
        /// The entry point or wasm file stem.
        session: String,
        signer: PublicKey,
        /// The arguments as decoded from the deploy's canonical encoding.
        args: NamedArgSet,
    },
}

#[derive(Debug, Clone, Copy, Default)]
struct BidRecord {
    amount: U512,
    rate: u8,
}

/// Global state as of one block.
#[derive(Debug, Clone, Default)]
struct State {
    accounts: BTreeMap<AccountHash, AccountRecord>,
    balances: BTreeMap<URef, U512>,
    bids: BTreeMap<PublicKey, BidRecord>,
    /// Keyed by `(validator, delegator)`.
    delegations: BTreeMap<(PublicKey, PublicKey), U512>,
}

#[derive(Default)]
struct Ledger {
    blocks: Vec<BlockSummary>,
    state: State,
    roots: BTreeMap<StateRootHash, State>,
    outcomes: BTreeMap<DeployHash, ExecutionOutcome>,
    allowances: BTreeMap<PublicKey, U512>,
    next_id: u64,
    calls: Vec<MockCall>,
}

#[derive(Default)]
struct Faults {
    unreachable: bool,
    status_ahead: bool,
    never_execute: bool,
    without_auction: bool,
    fail_create: Option<String>,
    fail_transfer: Option<String>,
    fail_submit: Option<String>,
}

fn digest(tag: u8, n: u64) -> Digest {
    let mut bytes = [tag; 32];
    for (dst, src) in bytes.iter_mut().rev().zip(n.to_le_bytes()) {
        *dst = src;
    }
    Digest(bytes)
}

impl Ledger {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn tip(&self) -> Option<&BlockSummary> {
        self.blocks.last()
    }

    fn seal_block(&mut self) -> BlockHash {
        let height = self.blocks.len() as u64;
        let block = BlockSummary {
            hash: digest(0xB0, height),
            height,
            state_root_hash: digest(0x5E, height),
        };
        let hash = block.hash;
        self.roots.insert(block.state_root_hash, self.state.clone());
        self.blocks.push(block);
        hash
    }

    /// Folds builder edits into the tip's snapshot.
    fn restate_tip(&mut self) {
        if let Some(root) = self.tip().map(|b| b.state_root_hash) {
            self.roots.insert(root, self.state.clone());
        }
    }

    fn state_at(&self, root: &StateRootHash) -> Option<&State> {
        self.roots.get(root)
    }

    fn new_purse(&mut self, balance: U512) -> URef {
        let purse = URef::new(digest(0x70, self.next()).0, AccessRights::READ_ADD_WRITE);
        self.state.balances.insert(purse, balance);
        purse
    }

    fn debit(&mut self, purse: &URef, amount: U512) -> Result<(), String> {
        let balance = self
            .state
            .balances
            .get_mut(purse)
            .ok_or_else(|| format!("purse {} not found", purse))?;
        if *balance < amount {
            return Err("Insufficient funds".into());
        }
        *balance -= amount;
        Ok(())
    }

    /// Stake stays in its source purse; the chain only checks it is covered.
    fn lock(&self, purse: &URef, amount: U512) -> Result<(), String> {
        match self.state.balances.get(purse) {
            None => Err(format!("purse {} not found", purse)),
            Some(balance) if *balance < amount => Err("Insufficient funds".into()),
            Some(_) => Ok(()),
        }
    }

    fn is_contract(&self, hash: &str) -> bool {
        self.state
            .accounts
            .values()
            .any(|a| a.named_keys.values().any(|k| k == hash))
    }
}

impl State {
    fn auction(&self, block: &BlockSummary) -> AuctionState {
        let mut validators: Vec<PublicKey> = self.bids.keys().copied().collect();
        for (validator, _) in self.delegations.keys() {
            if !validators.contains(validator) {
                validators.push(*validator);
            }
        }
        validators.sort();
        let bids = validators
            .into_iter()
            .map(|validator| {
                let record = self.bids.get(&validator).copied().unwrap_or_default();
                let delegators = self
                    .delegations
                    .iter()
                    .filter(|((v, _), _)| v == &validator)
                    .map(|((_, delegator), amount)| DelegatorStake {
                        public_key: *delegator,
                        staked_amount: *amount,
                    })
                    .collect();
                ValidatorBid {
                    public_key: validator,
                    staked_amount: record.amount,
                    delegation_rate: record.rate,
                    inactive: false,
                    delegators,
                }
            })
            .collect();
        AuctionState {
            state_root_hash: block.state_root_hash,
            block_height: block.height,
            bids,
        }
    }
}

fn arg<'a, T>(
    args: &'a NamedArgSet,
    name: &str,
    pick: impl Fn(&'a CLValue) -> Option<T>,
) -> Result<T, String> {
    args.get(name)
        .and_then(pick)
        .ok_or_else(|| format!("missing or mistyped argument '{}'", name))
}

fn public_key_arg(args: &NamedArgSet, name: &str) -> Result<PublicKey, String> {
    arg(args, name, |v| match v {
        CLValue::PublicKey(k) => Some(*k),
        _ => None,
    })
}

/// An in-memory chain with call recording and fault injection.
#[derive(Default)]
pub struct MockChain {
    ledger: Mutex<Ledger>,
    faults: Faults,
}

impl MockChain {
    /// A chain holding only its genesis block.
    pub fn new() -> Self {
        let chain = Self::default();
        chain.ledger().seal_block();
        chain
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an account whose main purse holds `balance`.
    pub fn with_account(self, public_key: PublicKey, balance: U512) -> Self {
        {
            let mut ledger = self.ledger();
            let main_purse = ledger.new_purse(balance);
            let account_hash = public_key.account_hash();
            ledger.state.accounts.insert(
                account_hash,
                AccountRecord {
                    account_hash,
                    main_purse,
                    named_keys: BTreeMap::new(),
                },
            );
            ledger.restate_tip();
        }
        self
    }

    /// Stores a contract under `name` in `owner`'s named keys.
    pub fn with_contract(self, owner: &PublicKey, name: &str) -> Self {
        {
            let mut ledger = self.ledger();
            let hash = format!("hash-{}", digest(0xC0, ledger.next()));
            if let Some(account) = ledger.state.accounts.get_mut(&owner.account_hash()) {
                account.named_keys.insert(name.to_string(), hash);
            }
            ledger.restate_tip();
        }
        self
    }

    /// Every request fails with a transport error.
    pub fn unreachable(mut self) -> Self {
        self.faults.unreachable = true;
        self
    }

    /// Status reports a block one past the tip, which no block lookup finds.
    pub fn status_ahead(mut self) -> Self {
        self.faults.status_ahead = true;
        self
    }

    /// Deploys are accepted but their execution outcome never appears.
    pub fn never_execute(mut self) -> Self {
        self.faults.never_execute = true;
        self
    }

    /// The node has no auction state to report.
    pub fn without_auction(mut self) -> Self {
        self.faults.without_auction = true;
        self
    }

    /// Purse-creation sessions fail execution with `message`.
    pub fn fail_create(mut self, message: &str) -> Self {
        self.faults.fail_create = Some(message.to_string());
        self
    }

    /// Transfer sessions fail execution with `message`.
    pub fn fail_transfer(mut self, message: &str) -> Self {
        self.faults.fail_transfer = Some(message.to_string());
        self
    }

    /// Stored-contract deploys are refused at submission with `message`.
    pub fn fail_submit(mut self, message: &str) -> Self {
        self.faults.fail_submit = Some(message.to_string());
        self
    }

    pub fn height(&self) -> u64 {
        self.ledger().tip().map_or(0, |b| b.height)
    }

    /// The sealed block at `height`.
    pub fn block_at(&self, height: u64) -> Option<BlockSummary> {
        self.ledger().blocks.iter().find(|b| b.height == height).cloned()
    }

    pub fn main_purse(&self, public_key: &PublicKey) -> Option<URef> {
        self.ledger()
            .state
            .accounts
            .get(&public_key.account_hash())
            .map(|a| a.main_purse)
    }

    pub fn named_key(&self, public_key: &PublicKey, name: &str) -> Option<String> {
        self.ledger()
            .state
            .accounts
            .get(&public_key.account_hash())
            .and_then(|a| a.named_keys.get(name).cloned())
    }

    pub fn balance(&self, purse: &URef) -> Option<U512> {
        self.ledger().state.balances.get(purse).copied()
    }

    /// The total bid of `validator`.
    pub fn bid(&self, validator: &PublicKey) -> U512 {
        self.ledger()
            .state
            .bids
            .get(validator)
            .map(|b| b.amount)
            .unwrap_or_default()
    }

    /// The total delegated by `delegator` to `validator`.
    pub fn delegation(&self, validator: &PublicKey, delegator: &PublicKey) -> U512 {
        self.ledger()
            .state
            .delegations
            .get(&(*validator, *delegator))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, spender: &PublicKey) -> Option<U512> {
        self.ledger().allowances.get(spender).copied()
    }

    /// Every recorded interaction, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.ledger().calls.clone()
    }

    /// Session labels of every submission attempt, in order.
    pub fn submissions(&self) -> Vec<String> {
        self.ledger()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::Submit { session, .. } => Some(session.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) -> Result<MutexGuard<'_, Ledger>, RemoteError> {
        if self.faults.unreachable {
            return Err(RemoteError::Transport("connection refused".into()));
        }
        let mut ledger = self.ledger();
        ledger.calls.push(call);
        Ok(ledger)
    }

    fn execute(
        &self,
        ledger: &mut Ledger,
        deploy: &DeployRequest,
        args: &NamedArgSet,
    ) -> Result<(), String> {
        let signer = deploy.signer.account_hash();
        match &deploy.session {
            Session::Wasm { path, .. } => {
                let stem = deploy.session.label();
                if stem.contains("create_purse") {
                    if let Some(message) = &self.faults.fail_create {
                        return Err(message.clone());
                    }
                    let name = arg(args, "purse_name", CLValue::as_str)?.to_string();
                    if !ledger.state.accounts.contains_key(&signer) {
                        return Err(format!("account {} not found", signer));
                    }
                    let purse = ledger.new_purse(U512::zero());
                    if let Some(account) = ledger.state.accounts.get_mut(&signer) {
                        account.named_keys.insert(name, purse.to_string());
                    }
                    Ok(())
                } else if stem.contains("transfer") {
                    if let Some(message) = &self.faults.fail_transfer {
                        return Err(message.clone());
                    }
                    let source = *arg(args, "source", CLValue::as_uref)?;
                    let target = *arg(args, "target", CLValue::as_uref)?;
                    let amount = *arg(args, "amount", CLValue::as_u512)?;
                    if !ledger.state.balances.contains_key(&target) {
                        return Err(format!("purse {} not found", target));
                    }
                    ledger.debit(&source, amount)?;
                    *ledger.state.balances.entry(target).or_default() += amount;
                    Ok(())
                } else {
                    Err(format!("unsupported session module {}", path.display()))
                }
            }
            Session::StoredContract {
                contract_hash,
                entry_point,
                ..
            } => {
                if !ledger.is_contract(contract_hash) {
                    return Err(format!("contract {} not found", contract_hash));
                }
                match entry_point.as_str() {
                    "add_bid" => {
                        let validator = public_key_arg(args, "public_key")?;
                        let purse = *arg(args, "source_purse", CLValue::as_uref)?;
                        let amount = *arg(args, "amount", CLValue::as_u512)?;
                        let rate = arg(args, "delegation_rate", |v| match v {
                            CLValue::U8(r) => Some(*r),
                            _ => None,
                        })?;
                        ledger.lock(&purse, amount)?;
                        let bid = ledger.state.bids.entry(validator).or_default();
                        bid.amount += amount;
                        bid.rate = rate;
                        Ok(())
                    }
                    "delegate" => {
                        let delegator = public_key_arg(args, "delegator")?;
                        let validator = public_key_arg(args, "validator")?;
                        let purse = *arg(args, "source_purse", CLValue::as_uref)?;
                        let amount = *arg(args, "amount", CLValue::as_u512)?;
                        ledger.lock(&purse, amount)?;
                        *ledger
                            .state
                            .delegations
                            .entry((validator, delegator))
                            .or_default() += amount;
                        Ok(())
                    }
                    "approve" => {
                        let spender = public_key_arg(args, "spender")?;
                        let amount = *arg(args, "amount", CLValue::as_u512)?;
                        ledger.allowances.insert(spender, amount);
                        Ok(())
                    }
                    other => Err(format!("unknown entry point '{}'", other)),
                }
            }
        }
    }
}

#[async_trait]
impl ChainQuery for MockChain {
    async fn get_status(&self) -> Result<NodeStatus, RemoteError> {
        let ledger = self.record(MockCall::Status)?;
        let ahead = u64::from(self.faults.status_ahead);
        Ok(NodeStatus {
            last_added_block_height: ledger.tip().map(|b| b.height + ahead),
            last_added_block_hash: ledger.tip().map(|b| {
                if self.faults.status_ahead {
                    digest(0xB0, b.height + 1)
                } else {
                    b.hash
                }
            }),
        })
    }

    async fn get_block_by_height(&self, height: u64) -> Result<Option<BlockSummary>, RemoteError> {
        let ledger = self.record(MockCall::Block(height))?;
        Ok(ledger.blocks.iter().find(|b| b.height == height).cloned())
    }

    async fn get_block_by_hash(
        &self,
        hash: &BlockHash,
    ) -> Result<Option<BlockSummary>, RemoteError> {
        let ledger = self.record(MockCall::BlockByHash(*hash))?;
        Ok(ledger.blocks.iter().find(|b| &b.hash == hash).cloned())
    }

    async fn get_account(
        &self,
        root: &StateRootHash,
        account: &AccountHash,
    ) -> Result<Option<AccountRecord>, RemoteError> {
        let ledger = self.record(MockCall::Account(*account))?;
        Ok(ledger
            .state_at(root)
            .and_then(|state| state.accounts.get(account))
            .cloned())
    }

    async fn get_balance(
        &self,
        root: &StateRootHash,
        purse: &URef,
    ) -> Result<Option<U512>, RemoteError> {
        let ledger = self.record(MockCall::Balance(*purse))?;
        Ok(ledger
            .state_at(root)
            .and_then(|state| state.balances.get(purse))
            .copied())
    }

    async fn get_execution_outcome(
        &self,
        deploy: &DeployHash,
    ) -> Result<Option<ExecutionOutcome>, RemoteError> {
        let ledger = self.record(MockCall::ExecutionOutcome(*deploy))?;
        if self.faults.never_execute {
            return Ok(None);
        }
        Ok(ledger.outcomes.get(deploy).cloned())
    }

    async fn get_auction_state(
        &self,
        block: &BlockHash,
    ) -> Result<Option<AuctionState>, RemoteError> {
        let ledger = self.record(MockCall::Auction(*block))?;
        if self.faults.without_auction {
            return Ok(None);
        }
        Ok(ledger
            .blocks
            .iter()
            .find(|b| &b.hash == block)
            .and_then(|b| ledger.state_at(&b.state_root_hash).map(|s| s.auction(b))))
    }
}

#[async_trait]
impl DeploySubmitter for MockChain {
    async fn submit(&self, deploy: &DeployRequest) -> Result<DeployHash, RemoteError> {
        let args = from_bytes_canonical::<NamedArgSet>(&deploy.encoded_args())
            .map_err(RemoteError::Submission)?;
        let mut ledger = self.record(MockCall::Submit {
            session: deploy.session.label(),
            signer: deploy.signer.public_key,
            args: args.clone(),
        })?;
        if let (Session::StoredContract { .. }, Some(message)) =
            (&deploy.session, &self.faults.fail_submit)
        {
            return Err(RemoteError::Submission(message.clone()));
        }

        let hash = DeployHash(digest(0xD0, ledger.next()));
        let error_message = self.execute(&mut ledger, deploy, &args).err();
        let block_hash = ledger.seal_block();
        ledger.outcomes.insert(
            hash,
            ExecutionOutcome {
                block_hash,
                error_message,
            },
        );
        Ok(hash)
    }
}

/// A connector handing out mock chains: one shared chain, optionally
/// overridden per node.
#[derive(Default, Clone)]
pub struct MockConnector {
    shared: Option<Arc<MockChain>>,
    nodes: HashMap<NodeId, Arc<MockChain>>,
}

impl MockConnector {
    pub fn new(shared: Arc<MockChain>) -> Self {
        Self {
            shared: Some(shared),
            nodes: HashMap::new(),
        }
    }

    pub fn with_node(mut self, node: NodeId, chain: Arc<MockChain>) -> Self {
        self.nodes.insert(node, chain);
        self
    }
}

impl NodeConnector for MockConnector {
    fn connect(&self, endpoint: &NodeEndpoint) -> Result<Arc<dyn NodeClient>, RemoteError> {
        let chain: Arc<MockChain> = self
            .nodes
            .get(&endpoint.node)
            .or(self.shared.as_ref())
            .cloned()
            .ok_or_else(|| RemoteError::Transport(format!("no mock chain for {}", endpoint.node)))?;
        Ok(chain as Arc<dyn NodeClient>)
    }
}
