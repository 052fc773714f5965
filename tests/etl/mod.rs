use std::sync::Arc;
use std::time::Duration;

use chainwatch::config::EtlConfig;
use chainwatch::core::ClientConfig;
use chainwatch::core::HeuristicInput;
use chainwatch::core::Network;
use chainwatch::core::PathConfig;
use chainwatch::core::PathMode;
use chainwatch::core::RegisterType;
use chainwatch::etl::registers::default_registry;
use chainwatch::etl::EtlManager;
use chainwatch::etl::PathState;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::chain_clients;
use crate::common::tx;
use crate::common::SyntheticChain;

fn manager(chain: Arc<SyntheticChain>) -> (EtlManager, mpsc::Receiver<HeuristicInput>) {
    let (engine_tx, engine_rx) = mpsc::channel(64);
    let manager = EtlManager::new(
        default_registry(),
        chain_clients(chain),
        EtlConfig::default(),
        engine_tx,
        CancellationToken::new(),
    );
    (manager, engine_rx)
}

fn config(
    data_type: RegisterType,
    start_height: Option<u64>,
    end_height: Option<u64>,
) -> PathConfig {
    PathConfig {
        network: Network::Layer1,
        data_type,
        mode: if end_height.is_some() {
            PathMode::Backtest
        } else {
            PathMode::Live
        },
        client: ClientConfig {
            poll_interval_ms: 50,
            start_height,
            end_height,
            address: None,
        },
    }
}

#[tokio::test(start_paused = true)]
async fn test_identical_configs_are_deduplicated() {
    let (manager, _rx) = manager(Arc::new(SyntheticChain::new(100)));

    let (a, a_existed) = manager.build_path(&config(RegisterType::Transaction, None, None)).unwrap();
    let (b, b_existed) = manager.build_path(&config(RegisterType::Transaction, None, None)).unwrap();
    let (c, _) = manager.build_path(&config(RegisterType::Transaction, Some(1), None)).unwrap();

    assert_eq!(a, b);
    assert!(!a_existed && b_existed);
    assert_ne!(a, c);
    assert_eq!(manager.active_count(), 2);
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_backtest_range_is_emitted_once_in_order() {
    let chain = Arc::new(SyntheticChain::new(100));
    let (manager, mut rx) = manager(chain);

    let (id, _) = manager.build_path(&config(RegisterType::Block, Some(1), Some(5))).unwrap();

    let mut heights = vec![];
    for _ in 0..5 {
        heights.push(rx.recv().await.unwrap().data.height());
    }
    assert_eq!(heights, vec![1, 2, 3, 4, 5]);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(manager.path_state(&id).unwrap(), PathState::Completed);
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_teardown_drains_in_flight_units() {
    let chain = Arc::new(SyntheticChain::new(1));
    chain.mine((0..20).map(|i| tx(2, Some("0x1"), i)).collect());
    let (manager, mut rx) = manager(chain.clone());
    let cfg = config(RegisterType::Transaction, Some(2), None);

    let (id, _) = manager.build_path(&cfg).unwrap();
    manager.build_path(&cfg).unwrap();
    let first = rx.recv().await.unwrap();
    assert_eq!(first.data.height(), 2);

    assert!(!manager.release_path(&id).await.unwrap());
    assert!(manager.release_path(&id).await.unwrap());

    // every transaction of the block that entered the path comes out
    let mut received = 1;
    while rx.try_recv().is_ok() {
        received += 1;
    }
    assert_eq!(received, 20);

    chain.mine(vec![tx(3, Some("0x1"), 1)]);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(manager.active_count(), 0);
}
