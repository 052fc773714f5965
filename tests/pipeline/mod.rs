use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::common::session;
use crate::common::subsystem;
use crate::common::tx;
use crate::common::Sink;
use crate::common::SyntheticChain;
use crate::common::POLL_INTERVAL_MS;

const THRESHOLD: u128 = 1_000;

async fn wait_for_height(
    sub: &chainwatch::subsystem::Subsystem,
    path_id: &chainwatch::core::PathId,
    height: u64,
) {
    for _ in 0..100 {
        if sub.etl().path_height(path_id).unwrap() == Some(height) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS / 2)).await;
    }
    panic!("path never reached height {height}");
}

#[tokio::test(start_paused = true)]
async fn test_live_tip_session_follows_synthetic_blocks() {
    let chain = Arc::new(SyntheticChain::new(100));
    let sink = Sink::new("ops");
    let sub = subsystem(chain.clone(), sink.clone());
    sub.start().unwrap();

    let session_id = sub
        .run_session(session("large_transfer", json!({"threshold": THRESHOLD as u64}), 0))
        .await
        .unwrap();
    let path_id = sub.engine().session(&session_id).unwrap().path_id.clone();
    wait_for_height(&sub, &path_id, 100).await;

    let blocks = [
        vec![tx(101, Some("0xa"), THRESHOLD)],
        vec![tx(102, Some("0xb"), THRESHOLD - 1)],
        vec![tx(103, Some("0xc"), THRESHOLD * 3), tx(103, None, 0)],
    ];
    let mut last = 100;
    for txs in blocks {
        let height = chain.mine(txs);
        wait_for_height(&sub, &path_id, height).await;
        let seen = sub.etl().path_height(&path_id).unwrap().unwrap();
        assert_eq!(seen, last + 1);
        last = seen;
    }

    sink.wait_for(2).await;
    sub.shutdown().await;

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().all(|a| a.session_id == session_id));
    assert!(alerts[0].content.contains("height 101"));
    assert!(alerts[1].content.contains("height 103"));
}

#[tokio::test(start_paused = true)]
async fn test_quiet_blocks_raise_no_alerts() {
    let chain = Arc::new(SyntheticChain::new(10));
    let sink = Sink::new("ops");
    let sub = subsystem(chain.clone(), sink.clone());
    sub.start().unwrap();

    let session_id = sub
        .run_session(session("contract_creation", serde_json::Value::Null, 0))
        .await
        .unwrap();
    let path_id = sub.engine().session(&session_id).unwrap().path_id.clone();
    for _ in 0..3 {
        let height = chain.mine(vec![tx(chain.tip() + 1, Some("0x1"), 5)]);
        wait_for_height(&sub, &path_id, height).await;
    }

    sub.shutdown().await;
    assert!(sink.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_limits_delivered_alerts() {
    let chain = Arc::new(SyntheticChain::new(10));
    let sink = Sink::new("ops");
    let sub = subsystem(chain.clone(), sink.clone());
    sub.start().unwrap();

    let session_id = sub
        .run_session(session("large_transfer", json!({"threshold": "1"}), 3600))
        .await
        .unwrap();
    let path_id = sub.engine().session(&session_id).unwrap().path_id.clone();
    wait_for_height(&sub, &path_id, 10).await;
    for _ in 0..3 {
        let height = chain.mine(vec![tx(chain.tip() + 1, Some("0x1"), 5)]);
        wait_for_height(&sub, &path_id, height).await;
    }

    sub.shutdown().await;
    assert_eq!(sink.alerts().len(), 1);
}
