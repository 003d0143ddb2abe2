// Path: crates/cli/tests/render_e2e.rs

use anyhow::Result;
use netctl_cli::testing::{MockChain, TestNetwork};
use netctl_cli::AccountRenderer;
use netctl_types::app::{AccountSelector, AccountType, NodeId};
use netctl_types::error::{ConfigError, NetctlError, QueryError, RemoteError};
use std::sync::Arc;

#[tokio::test]
async fn test_render_all_isolates_a_failing_node() -> Result<()> {
    let net = TestNetwork::builder().nodes(3).build()?;
    let connector = net
        .connector()
        .with_node(NodeId(2), Arc::new(MockChain::new().unreachable()));
    let renderer = AccountRenderer::new(&net.topology, &net.assets, &connector);

    let report = renderer.render_all(net.network, AccountType::Node, None).await?;

    assert_eq!(report.total(), 3);
    assert_eq!(report.failed(), 1);
    let rendered: Vec<_> = report.successes().map(|(node, _)| *node).collect();
    assert_eq!(rendered, vec![NodeId(1), NodeId(3)]);
    for (node, view) in report.successes() {
        assert_eq!(view.account, AccountSelector::node(*node));
        assert_eq!(view.public_key, net.public_key(&AccountSelector::node(*node)));
    }
    assert!(matches!(
        report.failures().next(),
        Some((NodeId(2), NetctlError::Query(_)))
    ));
    assert_eq!(
        report.into_outcome().unwrap_err(),
        NetctlError::PartialBatchFailure { failed: 1, total: 3 }
    );
    Ok(())
}

#[tokio::test]
async fn test_render_same_user_from_every_node() -> Result<()> {
    let net = TestNetwork::builder().nodes(2).users(3).build()?;
    let connector = net.connector();
    let renderer = AccountRenderer::new(&net.topology, &net.assets, &connector);

    let report = renderer
        .render_all(net.network, AccountType::User, Some(3))
        .await?;
    let views = report.into_outcome()?;
    assert_eq!(views.len(), 2);
    let key = net.public_key(&AccountSelector::user(3));
    assert!(views.iter().all(|(_, v)| v.public_key == key));
    Ok(())
}

#[tokio::test]
async fn test_render_rejects_invalid_selectors() -> Result<()> {
    let net = TestNetwork::builder().nodes(2).users(1).build()?;
    let connector = net.connector();
    let renderer = AccountRenderer::new(&net.topology, &net.assets, &connector);

    for selector in [
        AccountSelector {
            account_type: AccountType::Faucet,
            index: 2,
        },
        AccountSelector::node(NodeId(3)),
        AccountSelector::user(2),
    ] {
        let err = renderer
            .render_account(net.network, NodeId(1), selector)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NetctlError::Config(ConfigError::InvalidAccountSelector(_))
        ));
    }
    assert!(net.chain.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_render_single_node_unreachable() -> Result<()> {
    let net = TestNetwork::builder()
        .build_with(|chain| chain.unreachable())?;
    let connector = net.connector();
    let renderer = AccountRenderer::new(&net.topology, &net.assets, &connector);
    let err = renderer
        .render_account(net.network, NodeId(1), AccountSelector::faucet())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        NetctlError::Query(QueryError::StatusUnavailable(
            RemoteError::Transport("connection refused".into()).to_string()
        ))
    );
    Ok(())
}
