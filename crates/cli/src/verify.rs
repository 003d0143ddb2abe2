// Path: crates/cli/src/verify.rs

//! The chained read side: status → block → account → balance, and
//! status → block → auction for bids.
//!
//! Each hop consumes the previous hop's output, so a later value is only ever
//! read at the state root the earlier hops produced. A broken link ends the
//! chain with an error naming the hop; nothing is defaulted.

use crate::poll::wait_for;
use netctl_client::ChainQuery;
use netctl_types::app::{
    AccountHash, AccountRecord, AuctionState, BlockHash, PublicKey, StateRootHash, URef,
};
use netctl_types::error::{QueryError, RemoteError};
use netctl_types::prelude::OptionExt;
use netctl_types::U512;
use serde::Serialize;
use std::time::Duration;

/// A state root together with the block it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub block_height: u64,
    pub block_hash: BlockHash,
    pub state_root_hash: StateRootHash,
}

/// The outcome of a complete read chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainQueryResult {
    pub block_height: u64,
    pub state_root_hash: StateRootHash,
    pub purse: URef,
    #[serde(serialize_with = "crate::render::serialize_motes")]
    pub balance: U512,
}

/// Hops 1 and 2: the latest block height and its state root.
pub async fn latest_state<C>(client: &C) -> Result<StateSnapshot, QueryError>
where
    C: ChainQuery + ?Sized,
{
    let status = client
        .get_status()
        .await
        .map_err(|e| QueryError::StatusUnavailable(e.to_string()))?;
    let height = status
        .last_added_block_height
        .required_with(|| QueryError::StatusUnavailable("node has not added a block yet".into()))?;

    let block = client
        .get_block_by_height(height)
        .await
        .map_err(|e| QueryError::BlockNotFound(format!("height {}: {}", height, e)))?
        .required_with(|| QueryError::BlockNotFound(format!("height {}", height)))?;

    Ok(StateSnapshot {
        block_height: block.height,
        block_hash: block.hash,
        state_root_hash: block.state_root_hash,
    })
}

/// Hop 3: the account stored under `account` at `state`.
pub async fn account_at<C>(
    client: &C,
    state: &StateSnapshot,
    account: &AccountHash,
) -> Result<AccountRecord, QueryError>
where
    C: ChainQuery + ?Sized,
{
    client
        .get_account(&state.state_root_hash, account)
        .await
        .map_err(|e| QueryError::AccountNotFound(format!("{}: {}", account, e)))?
        .required_with(|| {
            QueryError::AccountNotFound(format!(
                "{} at state root {}",
                account, state.state_root_hash
            ))
        })
}

/// Hop 4: the balance of `purse` at `state`.
pub async fn balance_at<C>(
    client: &C,
    state: &StateSnapshot,
    purse: &URef,
) -> Result<U512, QueryError>
where
    C: ChainQuery + ?Sized,
{
    client
        .get_balance(&state.state_root_hash, purse)
        .await
        .map_err(|e| QueryError::PurseNotFound(format!("{}: {}", purse, e)))?
        .required_with(|| {
            QueryError::PurseNotFound(format!("{} at state root {}", purse, state.state_root_hash))
        })
}

/// Hop 3 of the bids read: the auction state as of `state`'s block.
pub async fn auction_at<C>(client: &C, state: &StateSnapshot) -> Result<AuctionState, QueryError>
where
    C: ChainQuery + ?Sized,
{
    client
        .get_auction_state(&state.block_hash)
        .await
        .map_err(|e| QueryError::AuctionUnavailable(format!("block {}: {}", state.block_hash, e)))?
        .required_with(|| {
            QueryError::AuctionUnavailable(format!("no auction state at block {}", state.block_hash))
        })
}

/// The auction bids at the latest block. With a `validator`, only that
/// validator's bid is kept, and its absence is [`QueryError::BidNotFound`].
pub async fn verify_bids<C>(
    client: &C,
    validator: Option<&PublicKey>,
) -> Result<AuctionState, QueryError>
where
    C: ChainQuery + ?Sized,
{
    let state = latest_state(client).await?;
    let mut auction = auction_at(client, &state).await?;
    if let Some(validator) = validator {
        let bid = auction.bid(validator).cloned().required_with(|| {
            QueryError::BidNotFound(format!("{} at block {}", validator, state.block_height))
        })?;
        auction.bids = vec![bid];
    }
    Ok(auction)
}

/// The main-purse balance of `account` at the latest block.
pub async fn verify_balance<C>(client: &C, account: &AccountHash) -> Result<ChainQueryResult, QueryError>
where
    C: ChainQuery + ?Sized,
{
    let state = latest_state(client).await?;
    let record = account_at(client, &state, account).await?;
    let balance = balance_at(client, &state, &record.main_purse).await?;
    Ok(ChainQueryResult {
        block_height: state.block_height,
        state_root_hash: state.state_root_hash,
        purse: record.main_purse,
        balance,
    })
}

/// The balance of an explicit purse at the latest block.
pub async fn verify_purse_balance<C>(client: &C, purse: &URef) -> Result<ChainQueryResult, QueryError>
where
    C: ChainQuery + ?Sized,
{
    let state = latest_state(client).await?;
    let balance = balance_at(client, &state, purse).await?;
    Ok(ChainQueryResult {
        block_height: state.block_height,
        state_root_hash: state.state_root_hash,
        purse: *purse,
        balance,
    })
}

/// Polls until `purse` holds at least `threshold`. Hop errors count as
/// "not visible yet" until `timeout` expires.
pub async fn wait_for_balance<C>(
    client: &C,
    purse: &URef,
    threshold: U512,
    interval: Duration,
    timeout: Duration,
) -> Result<ChainQueryResult, RemoteError>
where
    C: ChainQuery + ?Sized,
{
    wait_for(
        &format!("balance of {} to reach {}", purse, threshold),
        interval,
        timeout,
        || async move {
            let result = verify_purse_balance(client, purse).await?;
            if result.balance >= threshold {
                Ok::<_, QueryError>(Some(result))
            } else {
                log::debug!("{} holds {} (< {})", purse, result.balance, threshold);
                Ok(None)
            }
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChain;
    use netctl_types::app::Digest;
    use std::sync::Arc;

    fn funded_chain() -> (Arc<MockChain>, PublicKey) {
        let key = PublicKey::Ed25519([5; 32]);
        let chain = Arc::new(MockChain::new().with_account(key, U512::from(700u64)));
        (chain, key)
    }

    #[tokio::test]
    async fn reads_main_purse_balance_through_every_hop() {
        let (chain, key) = funded_chain();
        let result = verify_balance(chain.as_ref(), &key.account_hash()).await.unwrap();
        assert_eq!(result.balance, U512::from(700u64));
        assert_eq!(Some(result.purse), chain.main_purse(&key));
        assert_eq!(result.block_height, chain.height());
    }

    #[tokio::test]
    async fn unknown_account_is_account_not_found() {
        let (chain, _) = funded_chain();
        let stranger = PublicKey::Ed25519([6; 32]).account_hash();
        assert!(matches!(
            verify_balance(chain.as_ref(), &stranger).await,
            Err(QueryError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_purse_is_purse_not_found() {
        let (chain, _) = funded_chain();
        let purse: URef = format!("uref-{}-007", "99".repeat(32)).parse().unwrap();
        assert!(matches!(
            verify_purse_balance(chain.as_ref(), &purse).await,
            Err(QueryError::PurseNotFound(_))
        ));
    }

    #[tokio::test]
    async fn status_height_without_a_block_is_block_not_found() {
        let (chain, key) = funded_chain();
        let ahead = MockChain::new()
            .with_account(key, U512::from(700u64))
            .status_ahead();
        let err = verify_balance(&ahead, &key.account_hash()).await.unwrap_err();
        assert!(
            matches!(&err, QueryError::BlockNotFound(m) if m.contains(&format!("height {}", chain.height() + 1))),
            "{:?}",
            err
        );
        assert!(matches!(
            verify_bids(&ahead, None).await,
            Err(QueryError::BlockNotFound(_))
        ));
    }

    #[tokio::test]
    async fn reads_are_pinned_to_the_snapshot_root() {
        let (chain, key) = funded_chain();
        let genesis = latest_state(chain.as_ref()).await.unwrap();
        let stranger = PublicKey::Ed25519([6; 32]).account_hash();
        let unknown = StateSnapshot {
            block_height: 9,
            block_hash: Digest([9; 32]),
            state_root_hash: Digest([9; 32]),
        };
        assert!(matches!(
            account_at(chain.as_ref(), &unknown, &key.account_hash()).await,
            Err(QueryError::AccountNotFound(_))
        ));
        assert!(matches!(
            account_at(chain.as_ref(), &genesis, &stranger).await,
            Err(QueryError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_auction_state_is_auction_unavailable() {
        let chain = MockChain::new().without_auction();
        assert!(matches!(
            verify_bids(&chain, None).await,
            Err(QueryError::AuctionUnavailable(_))
        ));
        let chain = MockChain::new().unreachable();
        assert!(matches!(
            verify_bids(&chain, None).await,
            Err(QueryError::StatusUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn absent_validator_is_bid_not_found() {
        let (chain, _) = funded_chain();
        let auction = verify_bids(chain.as_ref(), None).await.unwrap();
        assert!(auction.bids.is_empty());
        assert_eq!(auction.block_height, chain.height());

        let validator = PublicKey::Ed25519([7; 32]);
        assert!(matches!(
            verify_bids(chain.as_ref(), Some(&validator)).await,
            Err(QueryError::BidNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_node_fails_the_first_hop() {
        let chain = MockChain::new().unreachable();
        assert!(matches!(
            latest_state(&chain).await,
            Err(QueryError::StatusUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn wait_for_balance_times_out_below_threshold() {
        let (chain, key) = funded_chain();
        let purse = chain.main_purse(&key).unwrap();
        let ok = wait_for_balance(
            chain.as_ref(),
            &purse,
            U512::from(700u64),
            Duration::from_millis(1),
            Duration::from_millis(50),
        )
        .await
        .unwrap();
        assert_eq!(ok.balance, U512::from(700u64));

        let err = wait_for_balance(
            chain.as_ref(),
            &purse,
            U512::from(701u64),
            Duration::from_millis(1),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RemoteError::Timeout(_)));
    }
}
