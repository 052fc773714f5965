use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::registers::BlockExtractor;
use super::registers::TransactionSplitter;
use super::*;
use crate::client::MockChainClient;
use crate::config::RouterConfig;
use crate::core::Block;
use crate::core::BlockHeader;
use crate::core::Network;
use crate::core::PathMode;
use crate::core::RegisterType;
use crate::core::TransitData;
use crate::metrics::RPC_FAILURES;
use crate::test_utils::block_with;
use crate::test_utils::transaction_data;
use crate::test_utils::transfer;
use crate::test_utils::FakeChain;
use crate::ClientError;
use crate::Error;
use crate::EtlError;

fn settings(
    mode: PathMode,
    start_height: Option<u64>,
    end_height: Option<u64>,
) -> ExtractorSettings {
    ExtractorSettings {
        network: Network::Layer1,
        mode,
        poll_interval: Duration::from_millis(100),
        start_height,
        end_height,
        max_retries: 2,
    }
}

fn fixed_header() -> BlockHeader {
    BlockHeader {
        number: 42,
        hash: "0xfixed".into(),
        parent_hash: "0xparent".into(),
        timestamp: 1_700_000_000,
    }
}

fn extractor(
    client: Arc<dyn crate::client::ChainClient>,
    settings: ExtractorSettings,
) -> (Arc<Extractor>, mpsc::Receiver<TransitData>) {
    let extractor = Extractor::new(
        RegisterType::Block,
        settings,
        Box::new(BlockExtractor::new(Network::Layer1, client)),
        &RouterConfig::default(),
    );
    let (tx, rx) = mpsc::channel(32);
    extractor.router().add_route("sink", Outlet::Component(tx)).unwrap();
    (Arc::new(extractor), rx)
}

#[tokio::test(start_paused = true)]
async fn backtest_emits_exactly_the_requested_range() {
    let mut client = MockChainClient::new();
    client.expect_header_by_number().returning(|_| Ok(fixed_header()));
    client.expect_block_by_number().returning(|_| {
        Ok(Block {
            header: fixed_header(),
            transactions: vec![],
        })
    });
    let (extractor, mut rx) = extractor(Arc::new(client), settings(PathMode::Backtest, Some(1), Some(5)));

    let exit = extractor.event_loop(CancellationToken::new()).await.unwrap();

    assert_eq!(exit, LoopExit::Completed);
    let mut emitted = 0;
    while rx.try_recv().is_ok() {
        emitted += 1;
    }
    assert_eq!(emitted, 5);
    assert_eq!(extractor.height(), Some(5));
}

#[tokio::test(start_paused = true)]
async fn backtest_gives_up_after_max_retries() {
    let mut client = MockChainClient::new();
    client.expect_header_by_number().times(3).returning(|_| {
        Err(ClientError::Rpc {
            code: -32000,
            message: "boom".into(),
        }
        .into())
    });
    let (extractor, _rx) = extractor(Arc::new(client), settings(PathMode::Backtest, Some(1), Some(5)));

    let err = extractor.event_loop(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Etl(EtlError::BacktestRetriesExhausted { height: 1, attempts: 3 })
    ));
    assert_eq!(extractor.height(), None);
}

#[tokio::test(start_paused = true)]
async fn live_extractor_keeps_retrying() {
    let chain = Arc::new(FakeChain::new(10));
    chain.set_unavailable(true);
    let (extractor, _rx) = extractor(chain.clone(), settings(PathMode::Live, None, None));

    let res = tokio::time::timeout(Duration::from_secs(5), extractor.event_loop(CancellationToken::new())).await;

    assert!(res.is_err(), "live loop must not end on rpc failures");
    assert!(chain.header_calls() > 10);
}

#[tokio::test(start_paused = true)]
async fn live_extractor_follows_the_tip() {
    let chain = Arc::new(FakeChain::new(10));
    let (extractor, mut rx) = extractor(chain.clone(), settings(PathMode::Live, None, None));
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let extractor = extractor.clone();
        let token = token.clone();
        async move { extractor.event_loop(token).await }
    });

    assert_eq!(rx.recv().await.unwrap().height(), 10);
    chain.mine(vec![]);
    chain.mine(vec![]);
    assert_eq!(rx.recv().await.unwrap().height(), 11);
    assert_eq!(rx.recv().await.unwrap().height(), 12);
    assert_eq!(extractor.height(), Some(12));

    token.cancel();
    assert_eq!(handle.await.unwrap().unwrap(), LoopExit::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn backtest_waits_for_heights_past_the_tip() {
    let chain = Arc::new(FakeChain::new(10));
    let (extractor, mut rx) = extractor(chain.clone(), settings(PathMode::Backtest, Some(8), Some(12)));
    let handle = tokio::spawn({
        let extractor = extractor.clone();
        async move { extractor.event_loop(CancellationToken::new()).await }
    });

    for expected in 8..=10 {
        assert_eq!(rx.recv().await.unwrap().height(), expected);
    }
    // Many more ticks than max_retries while the range is ahead of the chain
    tokio::time::sleep(Duration::from_secs(1)).await;
    chain.mine(vec![]);
    chain.mine(vec![]);

    assert_eq!(handle.await.unwrap().unwrap(), LoopExit::Completed);
    assert_eq!(rx.recv().await.unwrap().height(), 11);
    assert_eq!(rx.recv().await.unwrap().height(), 12);
    assert_eq!(extractor.height(), Some(12));
}

#[tokio::test(start_paused = true)]
async fn live_extractor_idles_at_the_tip_without_failures() {
    let failures = || RPC_FAILURES.with_label_values(&[Network::Layer2.as_str()]).get();
    let chain = Arc::new(FakeChain::new(10));
    let mut idle = settings(PathMode::Live, None, None);
    idle.network = Network::Layer2;
    let (extractor, mut rx) = extractor(chain.clone(), idle);
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let extractor = extractor.clone();
        let token = token.clone();
        async move { extractor.event_loop(token).await }
    });

    assert_eq!(rx.recv().await.unwrap().height(), 10);
    let before = failures();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(chain.header_calls() > 5);
    assert_eq!(failures(), before);

    chain.mine(vec![]);
    assert_eq!(rx.recv().await.unwrap().height(), 11);
    token.cancel();
    assert_eq!(handle.await.unwrap().unwrap(), LoopExit::Cancelled);
}

fn splitter() -> (Arc<Transform>, mpsc::Sender<TransitData>, mpsc::Receiver<TransitData>) {
    let transform = Transform::new(
        RegisterType::Transaction,
        TransactionSplitter::construct().unwrap(),
        &RouterConfig::default(),
    );
    let input = transform.input().unwrap();
    let (tx, rx) = mpsc::channel(32);
    transform.router().add_route("sink", Outlet::Component(tx)).unwrap();
    (Arc::new(transform), input, rx)
}

#[tokio::test]
async fn transform_fans_out_and_completes_on_closed_input() {
    let (transform, input, mut rx) = splitter();
    let handle = tokio::spawn({
        let transform = transform.clone();
        async move { transform.event_loop(CancellationToken::new()).await }
    });

    input
        .send(block_with(3, vec![transfer(3, Some("0x1"), 5), transfer(3, None, 0)]))
        .await
        .unwrap();
    drop(input);

    assert_eq!(handle.await.unwrap().unwrap(), LoopExit::Completed);
    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.data_type, RegisterType::Transaction);
    assert_eq!((first.height(), second.height()), (3, 3));
    assert_eq!(transform.height(), Some(3));
}

#[tokio::test]
async fn transform_error_skips_the_unit_only() {
    let (transform, input, mut rx) = splitter();
    let handle = tokio::spawn({
        let transform = transform.clone();
        async move { transform.event_loop(CancellationToken::new()).await }
    });

    input.send(transaction_data(transfer(1, None, 0))).await.unwrap();
    input.send(block_with(2, vec![transfer(2, None, 0)])).await.unwrap();
    drop(input);

    assert_eq!(handle.await.unwrap().unwrap(), LoopExit::Completed);
    assert_eq!(rx.recv().await.unwrap().height(), 2);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn transform_stops_on_cancellation() {
    let (transform, _input, _rx) = splitter();
    let token = CancellationToken::new();
    token.cancel();

    assert_eq!(transform.event_loop(token).await.unwrap(), LoopExit::Cancelled);
}

#[test]
fn component_ids_are_unique_per_instance() {
    let a = ComponentId::new(ComponentKind::Transform, RegisterType::Transaction);
    let b = ComponentId::new(ComponentKind::Transform, RegisterType::Transaction);
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("transform:transaction:"));
}
