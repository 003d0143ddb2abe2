// Path: crates/cli/src/purse.rs

//! Purse creation and one-way funding.
//!
//! The chain-side mechanics live behind [`PurseHost`]. [`FundingManager`]
//! adds the local rules: a zero amount is refused before the host is touched,
//! and host failures are returned as-is, never retried.

use crate::poll::wait_for;
use async_trait::async_trait;
use netctl_client::{ChainQuery, NodeClient};
use netctl_types::app::{DeployHash, DeployRequest, ExecutionOutcome, Session, Signer, URef};
use netctl_types::args::{CLValue, NamedArgSet};
use netctl_types::config::ExecutionWaitConfig;
use netctl_types::error::{NetctlError, RemoteError, ValidationError};
use netctl_types::U512;
use std::path::PathBuf;

/// The chain-side operations on purses.
#[async_trait]
pub trait PurseHost: Send + Sync {
    /// Creates a new, empty purse owned by the host's account.
    async fn create_purse(&self) -> Result<URef, RemoteError>;

    /// Moves `amount` from `source` to `target`.
    async fn transfer(&self, source: &URef, target: &URef, amount: U512) -> Result<(), RemoteError>;
}

pub struct FundingManager<H> {
    host: H,
}

impl<H: PurseHost> FundingManager<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub async fn create_purse(&self) -> Result<URef, NetctlError> {
        let purse = self.host.create_purse().await?;
        log::info!("Created purse {}", purse);
        Ok(purse)
    }

    /// Funds `dest` from `source`. Not idempotent: every call moves `amount`.
    pub async fn fund_purse(&self, source: &URef, dest: &URef, amount: U512) -> Result<(), NetctlError> {
        if amount.is_zero() {
            return Err(ValidationError::InvalidAmount("cannot fund a purse with 0 motes".into()).into());
        }
        self.host.transfer(source, dest, amount).await?;
        log::info!("Funded {} with {} motes from {}", dest, amount, source);
        Ok(())
    }
}

/// Waits until `deploy` has been executed and returns its result.
pub async fn wait_for_execution<C>(
    client: &C,
    deploy: &DeployHash,
    wait: &ExecutionWaitConfig,
) -> Result<ExecutionOutcome, RemoteError>
where
    C: ChainQuery + ?Sized,
{
    wait_for(
        &format!("execution of deploy {}", deploy),
        wait.interval(),
        wait.timeout(),
        || async move { client.get_execution_outcome(deploy).await },
    )
    .await
}

/// Session modules and deploy settings used by [`DeployPurseHost`].
#[derive(Debug, Clone)]
pub struct PurseSessions {
    pub chain_name: String,
    pub create_purse_wasm: PathBuf,
    pub transfer_wasm: PathBuf,
    pub payment: U512,
    pub gas_price: u64,
    pub wait: ExecutionWaitConfig,
}

/// A [`PurseHost`] that drives a live node with session deploys signed by
/// `owner`. New purses are stored under a unique named key of the owner's
/// account and read back at the state root of the executing block.
pub struct DeployPurseHost<'a, C: ?Sized> {
    client: &'a C,
    owner: Signer,
    sessions: PurseSessions,
}

impl<'a, C: NodeClient + ?Sized> DeployPurseHost<'a, C> {
    pub fn new(client: &'a C, owner: Signer, sessions: PurseSessions) -> Self {
        Self {
            client,
            owner,
            sessions,
        }
    }

    fn deploy(&self, session: Session) -> DeployRequest {
        DeployRequest {
            chain_name: self.sessions.chain_name.clone(),
            signer: self.owner.clone(),
            session,
            payment: self.sessions.payment,
            gas_price: self.sessions.gas_price,
        }
    }

    /// Submits a session and waits for it to execute. Every failure along the
    /// way is reported through `fail`.
    async fn execute(
        &self,
        session: Session,
        fail: fn(String) -> RemoteError,
    ) -> Result<ExecutionOutcome, RemoteError> {
        let label = session.label();
        let hash = self
            .client
            .submit(&self.deploy(session))
            .await
            .map_err(|e| fail(e.to_string()))?;
        log::debug!("{} deploy {} submitted", label, hash);
        let outcome = wait_for_execution(self.client, &hash, &self.sessions.wait)
            .await
            .map_err(|e| fail(e.to_string()))?;
        match &outcome.error_message {
            Some(message) => Err(fail(message.clone())),
            None => Ok(outcome),
        }
    }
}

#[async_trait]
impl<'a, C: NodeClient + ?Sized> PurseHost for DeployPurseHost<'a, C> {
    async fn create_purse(&self) -> Result<URef, RemoteError> {
        let name = format!("netctl-purse-{}", uuid::Uuid::new_v4().simple());
        let session = Session::Wasm {
            path: self.sessions.create_purse_wasm.clone(),
            args: NamedArgSet::new().with("purse_name", CLValue::String(name.clone())),
        };
        let outcome = self.execute(session, RemoteError::PurseCreationFailed).await?;

        let block = self
            .client
            .get_block_by_hash(&outcome.block_hash)
            .await?
            .ok_or_else(|| {
                RemoteError::PurseCreationFailed(format!(
                    "executing block {} is not available",
                    outcome.block_hash
                ))
            })?;
        let account = self
            .client
            .get_account(&block.state_root_hash, &self.owner.account_hash())
            .await?
            .ok_or_else(|| {
                RemoteError::PurseCreationFailed(format!(
                    "owner account {} not found",
                    self.owner.account_hash()
                ))
            })?;
        let key = account.named_keys.get(&name).ok_or_else(|| {
            RemoteError::PurseCreationFailed(format!("named key '{}' was not created", name))
        })?;
        key.parse::<URef>()
            .map_err(|e| RemoteError::PurseCreationFailed(format!("named key '{}': {}", name, e)))
    }

    async fn transfer(&self, source: &URef, target: &URef, amount: U512) -> Result<(), RemoteError> {
        let session = Session::Wasm {
            path: self.sessions.transfer_wasm.clone(),
            args: NamedArgSet::new()
                .with("source", CLValue::URef(*source))
                .with("target", CLValue::URef(*target))
                .with("amount", CLValue::U512(amount)),
        };
        self.execute(session, RemoteError::Transfer).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChain;
    use netctl_types::app::PublicKey;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingHost {
        calls: AtomicU32,
    }

    #[async_trait]
    impl PurseHost for CountingHost {
        async fn create_purse(&self) -> Result<URef, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RemoteError::PurseCreationFailed("host full".into()))
        }

        async fn transfer(&self, _: &URef, _: &URef, _: U512) -> Result<(), RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RemoteError::Transfer("Insufficient funds".into()))
        }
    }

    fn stalled_host(chain: &MockChain) -> DeployPurseHost<'_, MockChain> {
        let owner = Signer {
            public_key: PublicKey::Ed25519([0xFA; 32]),
            secret_key: PathBuf::from("faucet/secret_key.pem"),
        };
        let sessions = PurseSessions {
            chain_name: "casper-net-1".into(),
            create_purse_wasm: PathBuf::from("create_purse.wasm"),
            transfer_wasm: PathBuf::from("transfer_purse_to_purse.wasm"),
            payment: U512::from(1_000u64),
            gas_price: 1,
            wait: ExecutionWaitConfig {
                timeout_secs: 0,
                poll_interval_ms: 1,
            },
        };
        DeployPurseHost::new(chain, owner, sessions)
    }

    fn purse(byte: u8) -> URef {
        format!("uref-{}-007", hex::encode([byte; 32])).parse().unwrap()
    }

    #[tokio::test]
    async fn zero_amount_never_reaches_the_host() {
        let manager = FundingManager::new(CountingHost::default());
        let err = manager.fund_purse(&purse(1), &purse(2), U512::zero()).await.unwrap_err();
        assert!(matches!(
            err,
            NetctlError::Validation(ValidationError::InvalidAmount(_))
        ));
        assert_eq!(manager.host.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn host_errors_surface_verbatim_without_retry() {
        let manager = FundingManager::new(CountingHost::default());
        let err = manager
            .fund_purse(&purse(1), &purse(2), U512::from(5u64))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::Transfer("Insufficient funds".into()).into());
        assert!(manager.create_purse().await.is_err());
        assert_eq!(manager.host.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn execution_that_never_lands_is_reported_per_session() {
        let chain = MockChain::new()
            .with_account(PublicKey::Ed25519([0xFA; 32]), U512::from(1_000_000u64))
            .never_execute();
        let host = stalled_host(&chain);

        let err = host.create_purse().await.unwrap_err();
        assert!(
            matches!(&err, RemoteError::PurseCreationFailed(m) if m.contains("Timed out")),
            "{:?}",
            err
        );

        let err = host
            .transfer(&purse(1), &purse(2), U512::from(5u64))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Transfer(_)), "{:?}", err);
        assert_eq!(chain.submissions().len(), 2);
    }
}
