// Path: crates/cli/tests/staking_e2e.rs

use anyhow::Result;
use netctl_cli::testing::{MockCall, TestNetwork};
use netctl_cli::verify::{auction_at, balance_at, StateSnapshot};
use netctl_cli::{
    verify_balance, verify_bids, verify_purse_balance, DispatchStep, OperationKind,
    StakingOperationRequest,
};
use netctl_types::app::{AccountSelector, NodeId, PublicKey};
use netctl_types::args::CLValue;
use netctl_types::error::{NetctlError, QueryError, RemoteError, ValidationError};
use netctl_types::U512;

const STAKE: u64 = 1_000_000_000;

#[tokio::test]
async fn test_add_bid_end_to_end() -> Result<()> {
    let net = TestNetwork::builder().nodes(3).build()?;
    let connector = net.connector();
    let validator = net.public_key(&AccountSelector::node(NodeId(1)));

    let request = StakingOperationRequest {
        node: Some(NodeId(1)),
        delegation_rate: Some("10".into()),
        ..StakingOperationRequest::new(OperationKind::AddBid)
    };
    let report = net.dispatcher(&connector).dispatch(&request).await?;
    let purse = report.purse.expect("add-bid funds a purse");

    assert_eq!(
        net.chain.submissions(),
        vec!["create_purse_01", "transfer_purse_to_purse", "add_bid"]
    );
    let bid_args = net
        .chain
        .calls()
        .into_iter()
        .find_map(|c| match c {
            MockCall::Submit { session, args, .. } if session == "add_bid" => Some(args),
            _ => None,
        })
        .expect("add_bid was submitted");
    assert_eq!(bid_args.names(), vec!["public_key", "source_purse", "amount", "delegation_rate"]);
    assert_eq!(bid_args.get("public_key"), Some(&CLValue::PublicKey(validator)));
    assert_eq!(bid_args.get("source_purse"), Some(&CLValue::URef(purse)));
    assert_eq!(bid_args.get("amount"), Some(&CLValue::U512(U512::from(STAKE))));
    assert_eq!(bid_args.get("delegation_rate"), Some(&CLValue::U8(10)));
    assert_eq!(net.chain.bid(&validator), U512::from(STAKE));

    let seen = verify_purse_balance(net.chain.as_ref(), &purse).await?;
    assert!(seen.balance >= U512::from(STAKE));
    assert_eq!(report.steps.last(), Some(&DispatchStep::Submitted));
    Ok(())
}

#[tokio::test]
async fn test_funded_purse_holds_amount_before_submission() -> Result<()> {
    let net = TestNetwork::builder()
        .build_with(|chain| chain.fail_submit("deploy rejected"))?;
    let connector = net.connector();
    let request = StakingOperationRequest {
        delegation_rate: Some("5".into()),
        ..StakingOperationRequest::new(OperationKind::AddBid)
    };
    let err = net.dispatcher(&connector).dispatch(&request).await.unwrap_err();
    assert_eq!(
        err,
        NetctlError::Remote(RemoteError::Submission("deploy rejected".into()))
    );

    // The funded purse is abandoned, still holding the stake.
    let operator = net.public_key(&AccountSelector::node(NodeId(1)));
    let funded: Vec<_> = net
        .chain
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            MockCall::Submit { session, args, .. } if session == "transfer_purse_to_purse" => {
                args.get("target").and_then(CLValue::as_uref).copied()
            }
            _ => None,
        })
        .collect();
    assert_eq!(funded.len(), 1);
    let seen = verify_purse_balance(net.chain.as_ref(), &funded[0]).await?;
    assert!(seen.balance >= U512::from(STAKE));
    assert_eq!(net.chain.bid(&operator), U512::zero());
    Ok(())
}

#[tokio::test]
async fn test_delegate_orders_create_transfer_submit() -> Result<()> {
    let net = TestNetwork::builder().build()?;
    let connector = net.connector();
    let request = StakingOperationRequest {
        node: Some(NodeId(2)),
        user: Some(2),
        amount: Some("2500000000".into()),
        ..StakingOperationRequest::new(OperationKind::Delegate)
    };
    net.dispatcher(&connector).dispatch(&request).await?;

    assert_eq!(
        net.chain.submissions(),
        vec!["create_purse_01", "transfer_purse_to_purse", "delegate"]
    );
    let validator = net.public_key(&AccountSelector::node(NodeId(2)));
    let delegator = net.public_key(&AccountSelector::user(2));
    assert_eq!(
        net.chain.delegation(&validator, &delegator),
        U512::from(2_500_000_000u64)
    );
    Ok(())
}

#[tokio::test]
async fn test_delegate_to_explicit_validator() -> Result<()> {
    let net = TestNetwork::builder().build()?;
    let connector = net.connector();
    let other = PublicKey::Ed25519([0x42; 32]);
    let request = StakingOperationRequest {
        validator: Some(other.to_hex()),
        ..StakingOperationRequest::new(OperationKind::Delegate)
    };
    net.dispatcher(&connector).dispatch(&request).await?;

    let delegator = net.public_key(&AccountSelector::user(1));
    assert_eq!(net.chain.delegation(&other, &delegator), U512::from(STAKE));
    Ok(())
}

#[tokio::test]
async fn test_failed_transfer_prevents_submission() -> Result<()> {
    let net = TestNetwork::builder()
        .build_with(|chain| chain.fail_transfer("Insufficient funds"))?;
    let connector = net.connector();
    let request = StakingOperationRequest::new(OperationKind::Delegate);

    let err = net.dispatcher(&connector).dispatch(&request).await.unwrap_err();
    assert_eq!(
        err,
        NetctlError::Remote(RemoteError::Transfer("Insufficient funds".into()))
    );
    assert_eq!(
        net.chain.submissions(),
        vec!["create_purse_01", "transfer_purse_to_purse"]
    );
    Ok(())
}

#[tokio::test]
async fn test_underfunded_account_surfaces_transfer_message() -> Result<()> {
    let net = TestNetwork::builder().balance(U512::from(10u64)).build()?;
    let connector = net.connector();
    let err = net
        .dispatcher(&connector)
        .dispatch(&StakingOperationRequest::new(OperationKind::Delegate))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        NetctlError::Remote(RemoteError::Transfer("Insufficient funds".into()))
    );
    assert!(!net.chain.submissions().contains(&"delegate".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_approve_sets_allowance() -> Result<()> {
    let net = TestNetwork::builder().build()?;
    let connector = net.connector();
    let request = StakingOperationRequest {
        user: Some(1),
        amount: Some("750".into()),
        ..StakingOperationRequest::new(OperationKind::Approve)
    };
    let report = net.dispatcher(&connector).dispatch(&request).await?;

    assert_eq!(report.signer, net.public_key(&AccountSelector::faucet()));
    assert_eq!(net.chain.submissions(), vec!["approve"]);
    assert_eq!(
        net.chain
            .allowance(&net.public_key(&AccountSelector::user(1))),
        Some(U512::from(750u64))
    );
    Ok(())
}

#[tokio::test]
async fn test_validation_errors_precede_remote_calls() -> Result<()> {
    let net = TestNetwork::builder().build()?;
    let connector = net.connector();
    let dispatcher = net.dispatcher(&connector);

    let zero = StakingOperationRequest {
        amount: Some("0".into()),
        ..StakingOperationRequest::new(OperationKind::Delegate)
    };
    assert!(matches!(
        dispatcher.dispatch(&zero).await,
        Err(NetctlError::Validation(ValidationError::InvalidAmount(_)))
    ));

    let garbage = StakingOperationRequest {
        amount: Some("lots".into()),
        ..StakingOperationRequest::new(OperationKind::Delegate)
    };
    assert!(matches!(
        dispatcher.dispatch(&garbage).await,
        Err(NetctlError::Validation(ValidationError::InvalidArgument { .. }))
    ));

    let stranger = StakingOperationRequest {
        user: Some(9),
        ..StakingOperationRequest::new(OperationKind::Approve)
    };
    assert!(matches!(
        dispatcher.dispatch(&stranger).await,
        Err(NetctlError::Config(_))
    ));

    assert!(net.chain.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unfunded_account_is_not_reported_with_a_stale_balance() -> Result<()> {
    let net = TestNetwork::builder().build()?;
    let stranger = PublicKey::Ed25519([0x99; 32]).account_hash();
    let err = verify_balance(net.chain.as_ref(), &stranger).await.unwrap_err();
    assert!(matches!(err, QueryError::AccountNotFound(_)));
    Ok(())
}

fn genesis(net: &TestNetwork) -> StateSnapshot {
    let block = net.chain.block_at(0).expect("genesis is sealed");
    StateSnapshot {
        block_height: block.height,
        block_hash: block.hash,
        state_root_hash: block.state_root_hash,
    }
}

#[tokio::test]
async fn test_purse_funded_later_is_absent_at_an_earlier_root() -> Result<()> {
    let net = TestNetwork::builder().build()?;
    let connector = net.connector();
    let request = StakingOperationRequest {
        delegation_rate: Some("10".into()),
        ..StakingOperationRequest::new(OperationKind::AddBid)
    };
    let report = net.dispatcher(&connector).dispatch(&request).await?;
    let purse = report.purse.expect("add-bid funds a purse");

    let err = balance_at(net.chain.as_ref(), &genesis(&net), &purse)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::PurseNotFound(_)), "{:?}", err);

    let latest = verify_purse_balance(net.chain.as_ref(), &purse).await?;
    assert!(latest.block_height > 0);
    assert!(latest.balance >= U512::from(STAKE));
    Ok(())
}

#[tokio::test]
async fn test_bids_read_back_after_add_bid_and_delegate() -> Result<()> {
    let net = TestNetwork::builder().build()?;
    let connector = net.connector();
    let dispatcher = net.dispatcher(&connector);
    let validator = net.public_key(&AccountSelector::node(NodeId(1)));
    let delegator = net.public_key(&AccountSelector::user(2));

    dispatcher
        .dispatch(&StakingOperationRequest {
            node: Some(NodeId(1)),
            delegation_rate: Some("10".into()),
            ..StakingOperationRequest::new(OperationKind::AddBid)
        })
        .await?;
    dispatcher
        .dispatch(&StakingOperationRequest {
            node: Some(NodeId(1)),
            user: Some(2),
            amount: Some("2500000000".into()),
            ..StakingOperationRequest::new(OperationKind::Delegate)
        })
        .await?;

    let auction = verify_bids(net.chain.as_ref(), Some(&validator)).await?;
    assert_eq!(auction.block_height, net.chain.height());
    assert_eq!(auction.bids.len(), 1);
    let bid = &auction.bids[0];
    assert_eq!(bid.public_key, validator);
    assert_eq!(bid.staked_amount, U512::from(STAKE));
    assert_eq!(bid.delegation_rate, 10);
    assert_eq!(bid.delegation(&delegator), Some(U512::from(2_500_000_000u64)));

    let before = auction_at(net.chain.as_ref(), &genesis(&net)).await?;
    assert!(before.bid(&validator).is_none());
    Ok(())
}
